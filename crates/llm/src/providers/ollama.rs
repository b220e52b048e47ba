//! Ollama chat provider.
//!
//! Local model runtime, useful for running the pipeline without hosted
//! credentials. API: https://github.com/ollama/ollama/blob/main/docs/api.md

use super::{join_url, send_json};
use crate::client::{ChatRequest, ChatResponse, LlmClient, LlmUsage};
use reviewlens_core::AppResult;
use serde::{Deserialize, Serialize};

/// Ollama `/api/chat` request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessageOut<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "OllamaOptions::is_empty")]
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessageOut<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl OllamaOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_predict.is_none()
    }
}

/// Ollama `/api/chat` response format.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaMessageIn,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessageIn {
    #[serde(default)]
    content: String,
}

/// Ollama chat client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434", reqwest::Client::new())
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn to_ollama_request<'a>(&self, request: &'a ChatRequest) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessageOut {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }

    fn convert_response(&self, response: OllamaChatResponse) -> ChatResponse {
        ChatResponse {
            content: response.message.content,
            model: response.model,
            usage: LlmUsage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
            finish_reason: response.done_reason,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!("Sending chat request to Ollama (model: {})", request.model);
        tracing::debug!("Request: {:?}", request);

        let body = self.to_ollama_request(request);
        let builder = self
            .client
            .post(join_url(&self.base_url, "api/chat"))
            .json(&body);

        let ollama_response: OllamaChatResponse = send_json("Ollama", builder).await?;

        tracing::info!("Received completion from Ollama");
        tracing::debug!("Response: {:?}", ollama_response);

        Ok(self.convert_response(ollama_response))
    }
}
