//! Query rewriting: owner question -> compact search terms.

use crate::terms::parse_rewrite;
use crate::types::{label_generation_error, RewrittenQuery};
use reviewlens_core::{AppError, AppResult};
use reviewlens_llm::{ChatRequest, LlmClient};
use reviewlens_prompt::{build_prompt, PromptDefinition};
use std::sync::Arc;

/// Turns a natural-language question into search terms with one chat call.
pub struct QueryRewriter {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    strict_terms: bool,
}

impl QueryRewriter {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
            strict_terms: false,
        }
    }

    /// Treat unparseable rewriter output as an error rather than falling
    /// back to the question.
    pub fn with_strict_terms(mut self, strict: bool) -> Self {
        self.strict_terms = strict;
        self
    }

    /// Build the chat request for `question`: the rewrite instruction as the
    /// system turn and the question as the only user turn.
    pub fn build_request(&self, question: &str) -> AppResult<ChatRequest> {
        let built = build_prompt(&self.prompt, &serde_json::json!({ "question": question }))?;

        let mut request = ChatRequest::new(&self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        request = request.with_user(built.user);

        let parameters = built.metadata.parameters;
        if let Some(temperature) = parameters.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = parameters.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        Ok(request)
    }

    /// Rewrite `question` into search terms.
    ///
    /// Unparseable model output is not an error unless strict terms are on:
    /// the question itself becomes the search text.
    pub async fn rewrite(&self, question: &str) -> AppResult<RewrittenQuery> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput("Question cannot be empty".to_string()));
        }

        let request = self.build_request(question)?;
        tracing::debug!("Rewriting question with {}", self.client.provider_name());

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| label_generation_error("query rewrite", e))?;

        match parse_rewrite(&response.content) {
            Ok(query) => {
                tracing::info!(
                    "Rewrote question into {} term(s): {}",
                    query.terms.len(),
                    query.search_text
                );
                Ok(query)
            }
            Err(e) if self.strict_terms => {
                tracing::debug!("Rewriter output: {}", response.content);
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(
                    "Rewriter output unusable ({}); searching with the question instead",
                    e
                );
                tracing::debug!("Rewriter output: {}", response.content);
                Ok(RewrittenQuery::fallback(question, response.content))
            }
        }
    }
}
