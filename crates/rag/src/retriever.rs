//! Hybrid retrieval with score thresholding and business scoping.

use crate::search::{business_filter, SearchBackend, SearchRequest, VectorQuery, REVIEW_FIELDS};
use crate::types::{Retrieval, ReviewRecord};
use reviewlens_core::{AppError, AppResult};
use reviewlens_llm::EmbeddingClient;
use std::sync::Arc;

/// Runs one hybrid query per search text and keeps the hits that clear the
/// relevance threshold.
pub struct HybridRetriever {
    backend: Arc<dyn SearchBackend>,
    embedder: Option<Arc<dyn EmbeddingClient>>,
    vector_field: String,
    score_threshold: f64,
}

impl HybridRetriever {
    pub fn new(backend: Arc<dyn SearchBackend>, score_threshold: f64) -> Self {
        Self {
            backend,
            embedder: None,
            vector_field: "embedding".to_string(),
            score_threshold,
        }
    }

    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = field.into();
        self
    }

    /// Embed the search text client-side instead of letting the index
    /// vectorize it.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingClient>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Build the hybrid request. `vector` replaces the text vector query
    /// when present.
    pub fn build_request(
        &self,
        search_text: &str,
        scope: Option<&str>,
        top_k: usize,
        vector: Option<Vec<f32>>,
    ) -> SearchRequest {
        let fields = self.vector_field.clone();
        let vector_query = match vector {
            Some(vector) => VectorQuery::Vector {
                vector,
                k: top_k,
                fields,
            },
            None => VectorQuery::Text {
                text: search_text.to_string(),
                k: top_k,
                fields,
            },
        };

        SearchRequest {
            search: search_text.to_string(),
            vector_queries: vec![vector_query],
            select: REVIEW_FIELDS.join(","),
            top: top_k,
            filter: scope.map(business_filter),
        }
    }

    /// Retrieve up to `top_k` reviews for `search_text`.
    ///
    /// With a scope, only that business's reviews are ever returned. Hits
    /// scoring under the threshold are kept apart in `below_threshold`.
    pub async fn retrieve(
        &self,
        search_text: &str,
        scope: Option<&str>,
        top_k: usize,
    ) -> AppResult<Retrieval> {
        if top_k == 0 {
            return Err(AppError::InvalidInput("top_k must be at least 1".to_string()));
        }
        if search_text.trim().is_empty() {
            return Err(AppError::InvalidInput("Search text cannot be empty".to_string()));
        }

        let vector = match &self.embedder {
            Some(embedder) => {
                tracing::debug!("Embedding search text with {}", embedder.model_name());
                Some(embedder.embed(search_text).await?)
            }
            None => None,
        };

        let request = self.build_request(search_text, scope, top_k, vector);
        let hits = self.backend.search(&request).await?;
        let retrieval = self.partition(hits, scope);

        tracing::info!(
            "Retrieved {} review(s) at or above {} ({} below)",
            retrieval.reviews.len(),
            self.score_threshold,
            retrieval.below_threshold.len()
        );

        Ok(retrieval)
    }

    fn partition(&self, hits: Vec<ReviewRecord>, scope: Option<&str>) -> Retrieval {
        let mut retrieval = Retrieval::default();

        for hit in hits {
            if let Some(business_id) = scope {
                if hit.business_id != business_id {
                    tracing::warn!(
                        "Dropping review {} from business {} outside scope {}",
                        hit.review_id,
                        hit.business_id,
                        business_id
                    );
                    continue;
                }
            }

            if hit.score >= self.score_threshold {
                retrieval.reviews.push(hit);
            } else {
                retrieval.below_threshold.push(hit);
            }
        }

        retrieval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::doubles::{review, FixedEmbedder, FixedSearch};

    #[test]
    fn test_build_request_text_vector() {
        let retriever = HybridRetriever::new(Arc::new(FixedSearch::new(vec![])), 0.02);
        let request = retriever.build_request("nachos", Some("MX001"), 5, None);

        assert_eq!(request.search, "nachos");
        assert_eq!(request.top, 5);
        assert_eq!(request.filter.as_deref(), Some("business_id eq 'MX001'"));
        assert_eq!(
            request.vector_queries,
            vec![VectorQuery::Text {
                text: "nachos".to_string(),
                k: 5,
                fields: "embedding".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_threshold_splits_hits_in_engine_order() {
        let search = Arc::new(FixedSearch::new(vec![
            review("r1", "MX001", "Best nachos", 0.05),
            review("r2", "MX001", "Cold nachos", 0.01),
            review("r3", "MX001", "Nachos were fine", 0.02),
        ]));
        let retriever = HybridRetriever::new(search, 0.02);

        let retrieval = retriever.retrieve("nachos", None, 10).await.unwrap();

        let kept: Vec<&str> = retrieval.reviews.iter().map(|r| r.review_id.as_str()).collect();
        assert_eq!(kept, vec!["r1", "r3"]);
        assert_eq!(retrieval.below_threshold.len(), 1);
        assert_eq!(retrieval.below_threshold[0].review_id, "r2");
    }

    #[tokio::test]
    async fn test_scope_filters_request_and_drops_strays() {
        let search = Arc::new(FixedSearch::new(vec![
            review("r1", "MX001", "Great tacos", 0.04),
            review("r2", "OTHER", "Great burgers", 0.09),
        ]));
        let retriever = HybridRetriever::new(search.clone(), 0.02);

        let retrieval = retriever.retrieve("tacos", Some("MX001"), 3).await.unwrap();

        assert_eq!(retrieval.reviews.len(), 1);
        assert!(retrieval.reviews.iter().all(|r| r.business_id == "MX001"));
        assert!(retrieval.below_threshold.is_empty());

        let requests = search.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].filter.as_deref(), Some("business_id eq 'MX001'"));
        assert_eq!(requests[0].top, 3);
    }

    #[tokio::test]
    async fn test_no_hits_is_not_an_error() {
        let retriever = HybridRetriever::new(Arc::new(FixedSearch::new(vec![])), 0.02);
        let retrieval = retriever.retrieve("patio", None, 10).await.unwrap();
        assert!(retrieval.is_empty());
        assert!(retrieval.below_threshold.is_empty());
    }

    #[tokio::test]
    async fn test_embedder_supplies_query_vector() {
        let search = Arc::new(FixedSearch::new(vec![]));
        let retriever = HybridRetriever::new(search.clone(), 0.02)
            .with_vector_field("contentVector")
            .with_embedder(Arc::new(FixedEmbedder::new(vec![0.1, 0.2, 0.3])));

        retriever.retrieve("wait time", None, 4).await.unwrap();

        let requests = search.requests();
        assert_eq!(
            requests[0].vector_queries,
            vec![VectorQuery::Vector {
                vector: vec![0.1, 0.2, 0.3],
                k: 4,
                fields: "contentVector".to_string(),
            }]
        );
        assert_eq!(requests[0].search, "wait time");
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let search = Arc::new(FixedSearch::new(vec![]));
        let retriever = HybridRetriever::new(search.clone(), 0.02);

        let err = retriever.retrieve("nachos", None, 0).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = retriever.retrieve("  ", None, 5).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        assert!(search.requests().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let retriever = HybridRetriever::new(Arc::new(FixedSearch::failing("503 Service Unavailable")), 0.02);
        let err = retriever.retrieve("nachos", None, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }
}
