//! Evidence retrieval
//!
//! Issues a ranked full-text query against the knowledge index and extracts
//! a bounded list of passage bodies. Two call conventions coexist: the
//! strict form propagates index failures, the lenient form degrades to an
//! empty evidence set for flows that must never abort on retrieval.

use crate::errors::Result;
use crate::search::{RetrievedPassage, SearchClient};
use std::sync::Arc;

pub struct Retriever {
    client: Arc<dyn SearchClient>,
}

impl Retriever {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self { client }
    }

    /// Retrieve up to `topk` passages, best first. Hits without a `body`
    /// field are skipped silently. Returns the passages together with the
    /// raw hit count before body extraction.
    pub async fn retrieve(
        &self,
        query: &str,
        topk: usize,
    ) -> Result<(Vec<RetrievedPassage>, usize)> {
        let hits = self.client.search(query, topk).await?;
        let raw_count = hits.len();

        let passages: Vec<RetrievedPassage> = hits
            .into_iter()
            .filter_map(|hit| hit.source.body)
            .map(|body| RetrievedPassage { body })
            .collect();

        tracing::debug!(
            query,
            raw_hits = raw_count,
            passages = passages.len(),
            "Retrieved evidence"
        );

        Ok((passages, raw_count))
    }

    /// Lenient variant: any failure yields an empty evidence set and a zero
    /// hit count instead of an error.
    pub async fn retrieve_or_empty(
        &self,
        query: &str,
        topk: usize,
    ) -> (Vec<RetrievedPassage>, usize) {
        match self.retrieve(query, topk).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(query, error = %e, "Retrieval failed, continuing with empty evidence");
                (Vec::new(), 0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MockSearchClient;

    #[tokio::test]
    async fn test_retrieve_bounded_by_topk() {
        let client = Arc::new(MockSearchClient::with_passages(&["a", "b", "c", "d"]));
        let retriever = Retriever::new(client);

        let (passages, raw) = retriever.retrieve("fever", 3).await.unwrap();
        assert_eq!(passages.len(), 3);
        assert_eq!(raw, 3);
        assert_eq!(passages[0].body, "a");
    }

    #[tokio::test]
    async fn test_hits_without_body_are_skipped() {
        let client = Arc::new(MockSearchClient::with_sources(vec![
            Some("kept".to_string()),
            None,
            Some("also kept".to_string()),
        ]));
        let retriever = Retriever::new(client);

        let (passages, raw) = retriever.retrieve("q", 10).await.unwrap();
        assert_eq!(raw, 3);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[1].body, "also kept");
    }

    #[tokio::test]
    async fn test_strict_propagates_failure() {
        let retriever = Retriever::new(Arc::new(MockSearchClient::failing()));
        assert!(retriever.retrieve("q", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_lenient_degrades_to_empty() {
        let retriever = Retriever::new(Arc::new(MockSearchClient::failing()));
        let (passages, raw) = retriever.retrieve_or_empty("q", 5).await;
        assert!(passages.is_empty());
        assert_eq!(raw, 0);
    }
}
