//! Chroma vector store client.
//!
//! Talks to a Chroma server over its REST API: the collection is created
//! on first use with a cosine similarity metric, queries are embedded
//! through the configured `Embedder` and sent with an `$in` metadata
//! filter on the document type, and results come back as parallel
//! documents/distances arrays grouped per query.

use crate::embedder::Embedder;
use async_trait::async_trait;
use serde::Deserialize;
use sopchat_core::error::RetrievalError;
use sopchat_core::retrieval::{
    RetrievalQuery, RetrievalResult, ScoredPassage, SopDocument, VectorStore,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A Chroma-backed vector store for SOP documents.
pub struct ChromaStore {
    base_url: String,
    collection_name: String,
    embedder: Arc<dyn Embedder>,
    client: reqwest::Client,
    /// Collection UUID, resolved on first use.
    collection_id: RwLock<Option<String>>,
}

impl ChromaStore {
    pub fn new(
        base_url: impl Into<String>,
        collection_name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection_name: collection_name.into(),
            embedder,
            client,
            collection_id: RwLock::new(None),
        }
    }

    /// Get-or-create the collection and return its id.
    async fn ensure_collection(&self) -> Result<String, RetrievalError> {
        if let Some(id) = self.collection_id.read().await.clone() {
            return Ok(id);
        }

        let url = format!("{}/api/v1/collections", self.base_url);
        let body = serde_json::json!({
            "name": self.collection_name,
            "get_or_create": true,
            "metadata": { "hnsw:space": "cosine" },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Store(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Store(format!(
                "Collection get-or-create failed (status {status}): {text}"
            )));
        }

        let collection: ApiCollection = response
            .json()
            .await
            .map_err(|e| RetrievalError::Store(format!("Bad collection response: {e}")))?;

        debug!(collection = %self.collection_name, id = %collection.id, "Resolved collection");
        *self.collection_id.write().await = Some(collection.id.clone());
        Ok(collection.id)
    }

    fn type_filter(document_types: &[String]) -> Option<serde_json::Value> {
        if document_types.is_empty() {
            return None;
        }
        Some(serde_json::json!({
            "document_type": { "$in": document_types }
        }))
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    fn name(&self) -> &str {
        "chroma"
    }

    async fn query(&self, query: RetrievalQuery) -> Result<RetrievalResult, RetrievalError> {
        if query.texts.is_empty() {
            return Ok(RetrievalResult::default());
        }

        let collection_id = self.ensure_collection().await?;
        let query_embeddings = self.embedder.embed(&query.texts).await?;

        let url = format!(
            "{}/api/v1/collections/{}/query",
            self.base_url, collection_id
        );

        let mut body = serde_json::json!({
            "query_embeddings": query_embeddings,
            "n_results": query.limit,
            "include": ["documents", "distances"],
        });
        if let Some(filter) = Self::type_filter(&query.document_types) {
            body["where"] = filter;
        }

        debug!(
            queries = query.texts.len(),
            limit = query.limit,
            "Querying vector collection"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::QueryFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::QueryFailed(format!(
                "Query failed (status {status}): {text}"
            )));
        }

        let api_result: ApiQueryResult = response
            .json()
            .await
            .map_err(|e| RetrievalError::QueryFailed(format!("Bad query response: {e}")))?;

        Ok(api_result.into_retrieval_result())
    }

    async fn upsert(&self, documents: Vec<SopDocument>) -> Result<(), RetrievalError> {
        if documents.is_empty() {
            return Ok(());
        }

        let collection_id = self.ensure_collection().await?;
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;

        let ids: Vec<String> = documents
            .iter()
            .map(|d| {
                if d.id.is_empty() {
                    Uuid::new_v4().to_string()
                } else {
                    d.id.clone()
                }
            })
            .collect();
        let metadatas: Vec<serde_json::Value> = documents
            .iter()
            .map(|d| serde_json::json!({ "document_type": d.document_type }))
            .collect();

        let url = format!(
            "{}/api/v1/collections/{}/upsert",
            self.base_url, collection_id
        );
        let body = serde_json::json!({
            "ids": ids,
            "embeddings": embeddings,
            "documents": texts,
            "metadatas": metadatas,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Store(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Store(format!(
                "Upsert failed (status {status}): {text}"
            )));
        }

        Ok(())
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        let collection_id = self.ensure_collection().await?;
        let url = format!(
            "{}/api/v1/collections/{}/count",
            self.base_url, collection_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RetrievalError::Store(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RetrievalError::Store(format!(
                "Count failed (status {})",
                response.status().as_u16()
            )));
        }

        response
            .json::<usize>()
            .await
            .map_err(|e| RetrievalError::Store(format!("Bad count response: {e}")))
    }
}

// --- Chroma API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiCollection {
    id: String,
}

/// Parallel arrays, one outer entry per query text.
#[derive(Debug, Deserialize)]
struct ApiQueryResult {
    #[serde(default)]
    documents: Option<Vec<Vec<String>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

impl ApiQueryResult {
    fn into_retrieval_result(self) -> RetrievalResult {
        let documents = self.documents.unwrap_or_default();
        let distances = self.distances.unwrap_or_default();

        let groups = documents
            .into_iter()
            .zip(distances)
            .map(|(document_group, distance_group)| {
                document_group
                    .into_iter()
                    .zip(distance_group)
                    .map(|(text, distance)| ScoredPassage { text, distance })
                    .collect()
            })
            .collect();

        RetrievalResult { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_filter_shape() {
        let filter =
            ChromaStore::type_filter(&["truncated".into(), "complete".into()]).unwrap();
        assert_eq!(
            filter,
            serde_json::json!({"document_type": {"$in": ["truncated", "complete"]}})
        );
    }

    #[test]
    fn empty_type_filter_is_absent() {
        assert!(ChromaStore::type_filter(&[]).is_none());
    }

    #[test]
    fn parse_query_result() {
        let data = r#"{
            "ids": [["a", "b"]],
            "documents": [["refund SOP", "visa SOP"]],
            "distances": [[0.3, 0.8]]
        }"#;
        let parsed: ApiQueryResult = serde_json::from_str(data).unwrap();
        let result = parsed.into_retrieval_result();
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0][0].text, "refund SOP");
        assert!((result.groups[0][1].distance - 0.8).abs() < 1e-6);
    }

    #[test]
    fn parse_query_result_multiple_groups() {
        let data = r#"{
            "documents": [["refund SOP"], ["visa SOP"]],
            "distances": [[0.2], [0.4]]
        }"#;
        let parsed: ApiQueryResult = serde_json::from_str(data).unwrap();
        let result = parsed.into_retrieval_result();
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn parse_query_result_missing_fields() {
        let parsed: ApiQueryResult = serde_json::from_str("{}").unwrap();
        let result = parsed.into_retrieval_result();
        assert_eq!(result.total(), 0);
    }
}
