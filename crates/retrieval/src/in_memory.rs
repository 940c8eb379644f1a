//! In-memory vector store — useful for tests and offline runs.

use crate::distance::cosine_distance;
use crate::embedder::Embedder;
use async_trait::async_trait;
use sopchat_core::error::RetrievalError;
use sopchat_core::retrieval::{
    RetrievalQuery, RetrievalResult, ScoredPassage, SopDocument, VectorStore,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredDocument {
    document: SopDocument,
    embedding: Vec<f32>,
}

/// A vector store backed by a Vec, ranking by cosine distance.
///
/// Embedding is still delegated to an `Embedder`, so query behavior
/// matches the hosted store exactly.
pub struct InMemoryStore {
    embedder: Arc<dyn Embedder>,
    documents: Arc<RwLock<Vec<StoredDocument>>>,
}

impl InMemoryStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn query(&self, query: RetrievalQuery) -> Result<RetrievalResult, RetrievalError> {
        if query.texts.is_empty() {
            return Ok(RetrievalResult::default());
        }

        let query_embeddings = self.embedder.embed(&query.texts).await?;
        let documents = self.documents.read().await;

        let groups = query_embeddings
            .iter()
            .map(|query_embedding| {
                let mut scored: Vec<ScoredPassage> = documents
                    .iter()
                    .filter(|stored| {
                        query.document_types.is_empty()
                            || query
                                .document_types
                                .contains(&stored.document.document_type)
                    })
                    .map(|stored| ScoredPassage {
                        text: stored.document.text.clone(),
                        distance: cosine_distance(&stored.embedding, query_embedding),
                    })
                    .collect();

                scored.sort_by(|a, b| {
                    a.distance
                        .partial_cmp(&b.distance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                scored.truncate(query.limit);
                scored
            })
            .collect();

        Ok(RetrievalResult { groups })
    }

    async fn upsert(&self, documents: Vec<SopDocument>) -> Result<(), RetrievalError> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;

        let mut store = self.documents.write().await;
        for (mut document, embedding) in documents.into_iter().zip(embeddings) {
            if document.id.is_empty() {
                document.id = Uuid::new_v4().to_string();
            }
            store.retain(|stored| stored.document.id != document.id);
            store.push(StoredDocument {
                document,
                embedding,
            });
        }

        Ok(())
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        Ok(self.documents.read().await.len())
    }
}
