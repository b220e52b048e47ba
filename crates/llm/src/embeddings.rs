//! Text embedding clients.
//!
//! Used when the hybrid query's vector half is computed client-side instead
//! of by the search index's own vectorizer.

use crate::providers::join_url;
use reviewlens_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// API version of the Azure OpenAI embeddings endpoint.
pub const EMBEDDINGS_API_VERSION: &str = "2023-05-15";

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Get model or deployment identifier
    fn model_name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_first(self) -> AppResult<Vec<f32>> {
        self.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Azure OpenAI embedding deployment.
///
/// `POST {endpoint}/openai/deployments/{deployment}/embeddings?api-version=2023-05-15`
/// with an `api-key` header and `{"input": text}`. Any non-200 status is a
/// hard failure.
pub struct AzureEmbeddingClient {
    endpoint: String,
    deployment: String,
    api_key: String,
    client: reqwest::Client,
}

impl AzureEmbeddingClient {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn embeddings_url(&self) -> String {
        join_url(
            &self.endpoint,
            &format!(
                "openai/deployments/{}/embeddings?api-version={}",
                self.deployment, EMBEDDINGS_API_VERSION
            ),
        )
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for AzureEmbeddingClient {
    fn model_name(&self) -> &str {
        &self.deployment
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        tracing::debug!(
            "Requesting embedding from deployment '{}' ({} chars)",
            self.deployment,
            text.len()
        );

        let response = self
            .client
            .post(self.embeddings_url())
            .header("api-key", &self.api_key)
            .json(&EmbeddingRequest { input: text })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to reach embedding endpoint: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        let embedding = parsed.into_first()?;
        tracing::debug!("Received embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
