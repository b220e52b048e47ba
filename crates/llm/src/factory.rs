//! LLM client factory.
//!
//! Builds chat and embedding clients from `LlmSettings`, resolving which
//! credentials the chosen provider needs.

use crate::client::LlmClient;
use crate::embeddings::{AzureEmbeddingClient, EmbeddingClient};
use crate::providers::{AzureOpenAiClient, OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use reviewlens_core::config::LlmSettings;
use reviewlens_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Build the shared HTTP client with the configured timeout.
pub fn http_client(timeout_secs: u64) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Create a chat client for `provider`.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// endpoint/key is missing.
pub fn create_client(provider: &str, settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let http = http_client(settings.timeout_secs)?;

    match provider_type {
        ProviderType::OpenAI => {
            let api_key = required(&settings.openai_api_key, "OpenAI provider requires API key")?;
            Ok(Arc::new(OpenAiClient::with_base_url(
                settings.openai_base_url.as_str(),
                api_key,
                http,
            )))
        }
        ProviderType::Azure => {
            let endpoint = required(&settings.azure_endpoint, "Azure provider requires an endpoint")?;
            let deployment =
                required(&settings.azure_deployment, "Azure provider requires a deployment")?;
            let api_key = required(&settings.azure_api_key, "Azure provider requires API key")?;
            Ok(Arc::new(AzureOpenAiClient::new(
                endpoint,
                deployment,
                api_key,
                settings.azure_api_version.as_str(),
                http,
            )))
        }
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_base_url(
            settings.ollama_endpoint.as_str(),
            http,
        ))),
    }
}

/// Create the Azure embedding client used for client-side query vectors.
pub fn create_embedding_client(settings: &LlmSettings) -> AppResult<Arc<dyn EmbeddingClient>> {
    let endpoint = required(
        &settings.azure_endpoint,
        "Embeddings require AZURE_OPENAI_ENDPOINT",
    )?;
    let deployment = required(
        &settings.embedding_deployment,
        "Embeddings require AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
    )?;
    let api_key = required(
        &settings.azure_api_key,
        "Embeddings require AZURE_OPENAI_API_KEY",
    )?;

    Ok(Arc::new(AzureEmbeddingClient::new(
        endpoint,
        deployment,
        api_key,
        http_client(settings.timeout_secs)?,
    )))
}

fn required<'a>(value: &'a Option<String>, message: &str) -> AppResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(message.to_string()))
}
