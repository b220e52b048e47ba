//! OpenAI chat provider.
//!
//! API: `POST {base}/v1/chat/completions` with bearer authentication.

use super::{join_url, send_json, CompletionsRequest, CompletionsResponse};
use crate::client::{ChatRequest, ChatResponse, LlmClient};
use reviewlens_core::AppResult;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI (or OpenAI-compatible) chat client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI API.
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, client)
    }

    /// Create a client against a custom OpenAI-compatible base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn completions_url(&self) -> String {
        join_url(&self.base_url, "v1/chat/completions")
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!("Sending chat completion to OpenAI (model: {})", request.model);
        tracing::debug!("Request: {:?}", request);

        let body = CompletionsRequest::from_request(request, true);
        let builder = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body);

        let parsed: CompletionsResponse = send_json("OpenAI", builder).await?;
        let response = parsed.into_chat_response("OpenAI", &request.model)?;

        tracing::info!("Received completion from OpenAI");
        tracing::debug!("Usage: {:?}", response.usage);

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_client_creation() {
        let client = OpenAiClient::new("sk-test", reqwest::Client::new());
        assert_eq!(client.provider_name(), "openai");
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_custom_base_url() {
        let client =
            OpenAiClient::with_base_url("http://localhost:8080/", "k", reqwest::Client::new());
        assert_eq!(
            client.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
