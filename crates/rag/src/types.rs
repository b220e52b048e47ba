//! Review retrieval type definitions.

use reviewlens_core::AppError;
use serde::{Deserialize, Serialize};

/// A customer review as returned by the search index.
///
/// `score` is assigned per query by the engine and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub review_id: String,
    pub business_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Date exactly as the index stores it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub score: f64,
}

/// Where the search terms of a `RewrittenQuery` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermSource {
    /// Model answered with JSON (`{"terms": [...]}` or a string array)
    Structured,
    /// Model answered with a bracketed list literal
    Bracketed,
    /// Nothing parseable; the raw question is the search text
    Fallback,
}

/// Search terms derived from the owner's question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrittenQuery {
    /// Model output the terms were parsed from
    pub raw: String,
    pub terms: Vec<String>,
    /// Text sent to both halves of the hybrid query
    pub search_text: String,
    pub source: TermSource,
}

impl RewrittenQuery {
    /// Search with the question itself when the rewrite is unusable.
    pub fn fallback(question: &str, raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            terms: vec![question.to_string()],
            search_text: question.to_string(),
            source: TermSource::Fallback,
        }
    }

    pub fn used_fallback(&self) -> bool {
        self.source == TermSource::Fallback
    }
}

/// Outcome of one hybrid retrieval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    /// Hits at or above the threshold, in engine order
    pub reviews: Vec<ReviewRecord>,
    /// In-scope hits under the threshold, in engine order
    pub below_threshold: Vec<ReviewRecord>,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// Everything produced while answering one question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskOutcome {
    pub question: String,
    pub business_id: Option<String>,
    pub query: RewrittenQuery,
    /// Reviews handed to the synthesizer as evidence
    pub reviews: Vec<ReviewRecord>,
    /// Closest below-threshold reviews, only when `reviews` is empty
    pub alternatives: Vec<ReviewRecord>,
    /// Model answer, verbatim
    pub answer: String,
}

/// Prefix a generation failure with the stage that issued the call.
pub(crate) fn label_generation_error(stage: &str, err: AppError) -> AppError {
    match err {
        AppError::Generation(msg) => AppError::Generation(format!("{}: {}", stage, msg)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_query() {
        let query = RewrittenQuery::fallback("How is the patio?", "no list here");
        assert!(query.used_fallback());
        assert_eq!(query.search_text, "How is the patio?");
        assert_eq!(query.terms, vec!["How is the patio?".to_string()]);
        assert_eq!(query.raw, "no list here");
    }

    #[test]
    fn test_label_generation_error() {
        let labelled = label_generation_error(
            "answer synthesis",
            AppError::Generation("Azure OpenAI API error (500)".to_string()),
        );
        assert_eq!(
            labelled.to_string(),
            "Generation failed: answer synthesis: Azure OpenAI API error (500)"
        );

        let untouched = label_generation_error("query rewrite", AppError::Prompt("bad".to_string()));
        assert!(matches!(untouched, AppError::Prompt(_)));
    }

    #[test]
    fn test_review_record_serialization_skips_missing_fields() {
        let review = ReviewRecord {
            review_id: "r1".to_string(),
            business_id: "MX001".to_string(),
            content: "Great".to_string(),
            location: None,
            date: None,
            score: 0.05,
        };
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["reviewId"], "r1");
        assert!(json.get("location").is_none());
    }
}
