//! The question → terms → reviews → answer pipeline.

use crate::retriever::HybridRetriever;
use crate::rewriter::QueryRewriter;
use crate::search::AzureSearchClient;
use crate::session::Session;
use crate::synthesizer::AnswerSynthesizer;
use crate::types::AskOutcome;
use reviewlens_core::config::{AccessMode, VectorMode};
use reviewlens_core::{AppConfig, AppError, AppResult};
use reviewlens_llm::{create_client, create_embedding_client};
use reviewlens_prompt::{load_prompt, REWRITE_PROMPT_ID, SYNTHESIZE_PROMPT_ID};
use std::sync::Arc;
use tracing::Instrument;

/// Wires rewriter, retriever and synthesizer into one sequential run per
/// question.
pub struct ReviewPipeline {
    rewriter: QueryRewriter,
    retriever: HybridRetriever,
    synthesizer: AnswerSynthesizer,
    access_mode: AccessMode,
    top_k: usize,
}

impl ReviewPipeline {
    pub fn new(rewriter: QueryRewriter, retriever: HybridRetriever, synthesizer: AnswerSynthesizer) -> Self {
        Self {
            rewriter,
            retriever,
            synthesizer,
            access_mode: AccessMode::Open,
            top_k: 10,
        }
    }

    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Build the pipeline against the configured hosted services.
    ///
    /// Prompts are loaded from the workspace, falling back to the built-ins.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let client = create_client(&config.provider, &config.llm)?;
        let search = Arc::new(AzureSearchClient::from_settings(&config.search)?);

        let mut retriever = HybridRetriever::new(search, config.retrieval.score_threshold)
            .with_vector_field(config.search.vector_field.as_str());
        if config.search.vector_mode == VectorMode::Embedded {
            retriever = retriever.with_embedder(create_embedding_client(&config.llm)?);
        }

        let rewriter = QueryRewriter::new(
            client.clone(),
            config.model.as_str(),
            load_prompt(&config.workspace, REWRITE_PROMPT_ID)?,
        )
        .with_strict_terms(config.retrieval.strict_terms);
        let synthesizer = AnswerSynthesizer::new(
            client,
            config.model.as_str(),
            load_prompt(&config.workspace, SYNTHESIZE_PROMPT_ID)?,
            config.synthesis.temperature,
            config.synthesis.sentiment,
        );

        tracing::debug!(
            "Pipeline ready (provider: {}, model: {}, access: {:?})",
            config.provider,
            config.model,
            config.access.mode
        );

        Ok(Self::new(rewriter, retriever, synthesizer)
            .with_access_mode(config.access.mode)
            .with_top_k(config.retrieval.top_k))
    }

    /// Answer one question for `session`.
    ///
    /// The business scope is settled before any outbound call, so a refused
    /// session costs nothing. Retrieval and generation failures propagate
    /// unchanged; an empty retrieval still produces an answer.
    pub async fn ask(
        &self,
        session: &Session,
        question: &str,
        business_id: Option<&str>,
    ) -> AppResult<AskOutcome> {
        let span = tracing::info_span!("ask", session = %session.id());

        async move {
            let question = question.trim();
            if question.is_empty() {
                return Err(AppError::InvalidInput("Question cannot be empty".to_string()));
            }

            let scope = session.retrieval_scope(self.access_mode, business_id)?;
            match &scope {
                Some(id) => tracing::info!("Answering for business {}", id),
                None => tracing::info!("Answering across all businesses"),
            }

            let query = self.rewriter.rewrite(question).await?;
            let retrieval = self
                .retriever
                .retrieve(&query.search_text, scope.as_deref(), self.top_k)
                .await?;

            let alternatives = if retrieval.is_empty() {
                retrieval.below_threshold
            } else {
                Vec::new()
            };

            let answer = self
                .synthesizer
                .synthesize(question, &retrieval.reviews, &alternatives)
                .await?;

            Ok(AskOutcome {
                question: question.to_string(),
                business_id: scope,
                query,
                reviews: retrieval.reviews,
                alternatives,
                answer,
            })
        }
        .instrument(span)
        .await
    }
}
