//! Hybrid search requests and the backend seam.
//!
//! A request pairs the lexical `search` text with one vector query over the
//! same text, optionally filtered to one business.

pub mod azure;

pub use azure::AzureSearchClient;

use crate::types::ReviewRecord;
use reviewlens_core::AppResult;
use serde::Serialize;

/// Fields projected for every hit.
pub const REVIEW_FIELDS: [&str; 5] = ["review_id", "business_id", "review_content", "location", "date"];

/// Vector half of a hybrid query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VectorQuery {
    /// The index vectorizes `text` itself
    Text { text: String, k: usize, fields: String },
    /// A vector embedded client-side
    Vector { vector: Vec<f32>, k: usize, fields: String },
}

/// One hybrid search request, serialized as the search service expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search: String,
    pub vector_queries: Vec<VectorQuery>,
    pub select: String,
    pub top: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Equality filter restricting hits to one business.
///
/// Single quotes in the id are doubled, as OData string literals require.
pub fn business_filter(business_id: &str) -> String {
    format!("business_id eq '{}'", business_id.replace('\'', "''"))
}

/// A hybrid search service.
///
/// Implementations return hits in engine ranking order and report every
/// failure as `AppError::Retrieval`.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<ReviewRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_filter() {
        assert_eq!(business_filter("MX001"), "business_id eq 'MX001'");
        assert_eq!(business_filter("O'Brien"), "business_id eq 'O''Brien'");
    }

    #[test]
    fn test_request_wire_format() {
        let request = SearchRequest {
            search: "nachos".to_string(),
            vector_queries: vec![VectorQuery::Text {
                text: "nachos".to_string(),
                k: 5,
                fields: "embedding".to_string(),
            }],
            select: REVIEW_FIELDS.join(","),
            top: 5,
            filter: Some(business_filter("MX001")),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "search": "nachos",
                "vectorQueries": [
                    {"kind": "text", "text": "nachos", "k": 5, "fields": "embedding"}
                ],
                "select": "review_id,business_id,review_content,location,date",
                "top": 5,
                "filter": "business_id eq 'MX001'"
            })
        );
    }

    #[test]
    fn test_unfiltered_request_omits_filter() {
        let request = SearchRequest {
            search: "patio".to_string(),
            vector_queries: vec![VectorQuery::Vector {
                vector: vec![0.5, 0.25],
                k: 3,
                fields: "embedding".to_string(),
            }],
            select: REVIEW_FIELDS.join(","),
            top: 3,
            filter: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("filter").is_none());
        assert_eq!(json["vectorQueries"][0]["kind"], "vector");
        assert_eq!(json["vectorQueries"][0]["vector"][1], 0.25);
    }
}
