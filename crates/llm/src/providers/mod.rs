//! Chat provider implementations.
//!
//! OpenAI and Azure OpenAI share the chat-completions wire format defined
//! here; Ollama has its own.

pub mod azure;
pub mod ollama;
pub mod openai;

pub use azure::AzureOpenAiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::client::{ChatRequest, ChatResponse, LlmUsage};
use reviewlens_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Chat-completions request body.
#[derive(Debug, Serialize)]
pub(crate) struct CompletionsRequest<'a> {
    /// Azure routes by deployment and ignores the model field
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<CompletionsMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CompletionsMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> CompletionsRequest<'a> {
    pub(crate) fn from_request(request: &'a ChatRequest, include_model: bool) -> Self {
        Self {
            model: include_model.then_some(request.model.as_str()),
            messages: request
                .messages
                .iter()
                .map(|m| CompletionsMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Chat-completions response body.
#[derive(Debug, Deserialize)]
pub(crate) struct CompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionsChoice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionsChoice {
    message: CompletionsChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionsChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionsResponse {
    /// Take the first choice. `fallback_model` fills in a missing model name.
    pub(crate) fn into_chat_response(
        self,
        provider: &str,
        fallback_model: &str,
    ) -> AppResult<ChatResponse> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            AppError::Generation(format!("{} returned no completion choices", provider))
        })?;

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
            usage: self.usage.unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }
}

/// Send a prepared request and decode a JSON body, mapping every failure to
/// `AppError::Generation`.
pub(crate) async fn send_json<T>(provider: &str, builder: reqwest::RequestBuilder) -> AppResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let response = builder
        .send()
        .await
        .map_err(|e| AppError::Generation(format!("Failed to send request to {}: {}", provider, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::Generation(format!(
            "{} API error ({}): {}",
            provider, status, error_text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Generation(format!("Failed to parse {} response: {}", provider, e)))
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
