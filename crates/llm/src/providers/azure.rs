//! Azure OpenAI chat provider.
//!
//! API: `POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
//! with an `api-key` header. The deployment selects the model.

use super::{join_url, send_json, CompletionsRequest, CompletionsResponse};
use crate::client::{ChatRequest, ChatResponse, LlmClient};
use reviewlens_core::AppResult;

/// Azure OpenAI chat client bound to one deployment.
pub struct AzureOpenAiClient {
    endpoint: String,
    deployment: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl AzureOpenAiClient {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            client,
        }
    }

    fn completions_url(&self) -> String {
        join_url(
            &self.endpoint,
            &format!(
                "openai/deployments/{}/chat/completions?api-version={}",
                self.deployment, self.api_version
            ),
        )
    }
}

#[async_trait::async_trait]
impl LlmClient for AzureOpenAiClient {
    fn provider_name(&self) -> &str {
        "azure"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!(
            "Sending chat completion to Azure OpenAI (deployment: {})",
            self.deployment
        );
        tracing::debug!("Request: {:?}", request);

        let body = CompletionsRequest::from_request(request, false);
        let builder = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&body);

        let parsed: CompletionsResponse = send_json("Azure OpenAI", builder).await?;
        let response = parsed.into_chat_response("Azure OpenAI", &self.deployment)?;

        tracing::info!("Received completion from Azure OpenAI");
        tracing::debug!("Usage: {:?}", response.usage);

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        let client = AzureOpenAiClient::new(
            "https://contoso.openai.azure.com/",
            "gpt-4",
            "key",
            "2024-02-01",
            reqwest::Client::new(),
        );
        assert_eq!(client.provider_name(), "azure");
        assert_eq!(
            client.completions_url(),
            "https://contoso.openai.azure.com/openai/deployments/gpt-4/chat/completions?api-version=2024-02-01"
        );
    }
}
