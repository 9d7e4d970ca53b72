//! Full-text search service abstraction
//!
//! Provides a thin client interface over the knowledge index:
//! - Elasticsearch match-query client
//! - Mock client for testing

use crate::config::SearchConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Mutex;

/// A single hit returned by the search service
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_source", default)]
    pub source: HitSource,
}

/// Source document of a hit; `body` is optional because partially indexed
/// documents exist in the corpus and are skipped, not rejected
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitSource {
    #[serde(default)]
    pub body: Option<String>,
}

/// A retrieved passage body backing a synthesized answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub body: String,
}

/// Trait for ranked full-text search
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Issue a match query against the knowledge index, best hits first
    async fn search(&self, query: &str, size: usize) -> Result<Vec<SearchHit>>;
}

/// Elasticsearch `_search` client
pub struct ElasticClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct EsResponse {
    #[serde(default)]
    hits: EsHitsWrapper,
}

#[derive(Default, Deserialize)]
struct EsHitsWrapper {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

impl ElasticClient {
    /// Create a new client from configuration
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl SearchClient for ElasticClient {
    async fn search(&self, query: &str, size: usize) -> Result<Vec<SearchHit>> {
        // POST _search is the safe form across index versions
        let payload = json!({
            "query": { "match": { "body": query } },
            "size": size,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Search {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Search {
                message: format!("Index error {}: {}", status, body),
            });
        }

        let result: EsResponse = response.json().await.map_err(|e| AppError::Search {
            message: format!("Failed to parse response: {}", e),
        })?;

        Ok(result.hits.hits)
    }
}

/// Mock search client for testing
pub struct MockSearchClient {
    passages: Vec<Option<String>>,
    fail: bool,
    queries: Mutex<Vec<(String, usize)>>,
}

impl MockSearchClient {
    /// A client whose index contains exactly the given passage bodies
    pub fn with_passages(passages: &[&str]) -> Self {
        Self {
            passages: passages.iter().map(|p| Some((*p).to_string())).collect(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A client whose hits may lack a body field
    pub fn with_sources(sources: Vec<Option<String>>) -> Self {
        Self {
            passages: sources,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A client that fails every call with a transport-style error
    pub fn failing() -> Self {
        Self {
            passages: Vec::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries seen so far, in call order
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(&self, query: &str, size: usize) -> Result<Vec<SearchHit>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), size));

        if self.fail {
            return Err(AppError::Search {
                message: "connection refused".to_string(),
            });
        }

        Ok(self
            .passages
            .iter()
            .take(size)
            .map(|body| SearchHit {
                source: HitSource { body: body.clone() },
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_respects_size() {
        let client = MockSearchClient::with_passages(&["a", "b", "c"]);
        let hits = client.search("q", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(client.queries(), vec![("q".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockSearchClient::failing();
        assert!(client.search("q", 5).await.is_err());
    }

    #[test]
    fn test_hit_deserialization_without_body() {
        let hit: SearchHit = serde_json::from_str(r#"{"_source": {"title": "x"}}"#).unwrap();
        assert!(hit.source.body.is_none());
    }
}
