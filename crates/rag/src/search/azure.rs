//! Azure AI Search backend.
//!
//! API: `POST {endpoint}/indexes/{index}/docs/search?api-version=...` with an
//! `api-key` header. Hits come back under `value`, each with `@search.score`.

use super::{SearchBackend, SearchRequest};
use crate::types::ReviewRecord;
use reviewlens_core::config::SearchSettings;
use reviewlens_core::{AppError, AppResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "@search.score")]
    score: f64,
    review_id: String,
    business_id: String,
    // The index returns null for selected fields with no value
    #[serde(default)]
    review_content: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

impl From<SearchHit> for ReviewRecord {
    fn from(hit: SearchHit) -> Self {
        ReviewRecord {
            review_id: hit.review_id,
            business_id: hit.business_id,
            content: hit.review_content.unwrap_or_default(),
            location: hit.location,
            date: hit.date,
            score: hit.score,
        }
    }
}

/// Search client bound to one index.
pub struct AzureSearchClient {
    endpoint: String,
    index_name: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl AzureSearchClient {
    pub fn new(
        endpoint: impl Into<String>,
        index_name: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            index_name: index_name.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            client,
        }
    }

    /// Build a client from validated search settings.
    pub fn from_settings(settings: &SearchSettings) -> AppResult<Self> {
        let missing = |name: &str| AppError::Config(format!("Missing required setting: {}", name));

        let endpoint = settings
            .endpoint
            .as_deref()
            .ok_or_else(|| missing("AZURE_SEARCH_ENDPOINT"))?;
        let index_name = settings
            .index_name
            .as_deref()
            .ok_or_else(|| missing("AZURE_SEARCH_INDEX_NAME"))?;
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| missing("AZURE_SEARCH_API_KEY"))?;

        let client = reviewlens_llm::http_client(settings.timeout_secs)?;

        Ok(Self::new(
            endpoint,
            index_name,
            api_key,
            settings.api_version.as_str(),
            client,
        ))
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.index_name,
            self.api_version
        )
    }
}

#[async_trait::async_trait]
impl SearchBackend for AzureSearchClient {
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<ReviewRecord>> {
        tracing::debug!(
            "Searching index '{}' (top: {}, filtered: {})",
            self.index_name,
            request.top,
            request.filter.is_some()
        );

        let response = self
            .client
            .post(self.search_url())
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to reach search service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Search API error ({}): {}",
                status, error_text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse search response: {}", e)))?;

        tracing::debug!("Search returned {} hits", body.value.len());
        Ok(body.value.into_iter().map(ReviewRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let client = AzureSearchClient::new(
            "https://reviews.search.windows.net/",
            "reviews-index",
            "key",
            "2023-11-01",
            reqwest::Client::new(),
        );
        assert_eq!(
            client.search_url(),
            "https://reviews.search.windows.net/indexes/reviews-index/docs/search?api-version=2023-11-01"
        );
    }

    #[test]
    fn test_from_settings_requires_index() {
        let settings = SearchSettings {
            endpoint: Some("https://reviews.search.windows.net".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let err = AzureSearchClient::from_settings(&settings).err().unwrap();
        assert!(err.to_string().contains("AZURE_SEARCH_INDEX_NAME"));
    }

    #[test]
    fn test_response_decoding_keeps_engine_order() {
        let raw = r#"{
            "@odata.context": "ignored",
            "value": [
                {"@search.score": 0.05, "review_id": "r1", "business_id": "MX001",
                 "review_content": "Best nachos in town", "location": "Austin", "date": "2024-03-01"},
                {"@search.score": 0.01, "review_id": "r2", "business_id": "MX001",
                 "review_content": "Nachos were cold", "location": null}
            ]
        }"#;

        let body: SearchResponse = serde_json::from_str(raw).unwrap();
        let records: Vec<ReviewRecord> = body.value.into_iter().map(ReviewRecord::from).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].review_id, "r1");
        assert_eq!(records[0].content, "Best nachos in town");
        assert_eq!(records[0].location.as_deref(), Some("Austin"));
        assert_eq!(records[1].score, 0.01);
        assert_eq!(records[1].location, None);
        assert_eq!(records[1].date, None);
    }
    #[test]
    fn test_null_review_content_decodes_as_empty() {
        let raw = r#"{
            "value": [
                {"@search.score": 0.04, "review_id": "r1", "business_id": "MX001",
                 "review_content": "Loved the mole"},
                {"@search.score": 0.03, "review_id": "r2", "business_id": "MX001",
                 "review_content": null, "location": null, "date": null},
                {"@search.score": 0.02, "review_id": "r3", "business_id": "MX001"}
            ]
        }"#;

        let body: SearchResponse = serde_json::from_str(raw).unwrap();
        let records: Vec<ReviewRecord> = body.value.into_iter().map(ReviewRecord::from).collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].content, "Loved the mole");
        assert_eq!(records[1].content, "");
        assert_eq!(records[2].content, "");
    }
}
