//! VectorStore trait — the abstraction over the vector index collaborator.
//!
//! The store owns a persistent, named collection of SOP documents with a
//! cosine similarity metric. Embedding computation is delegated to the
//! collaborator: callers hand over text, not vectors. Implementations:
//! Chroma-style HTTP store, in-memory (for tests and offline runs).

use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An SOP document held by (or destined for) the vector collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SopDocument {
    /// Unique document ID
    pub id: String,

    /// The document text (typically a JSON-formatted SOP snippet)
    pub text: String,

    /// Document type tag ("truncated", "complete", ...) used for filtering
    pub document_type: String,
}

/// A query against the vector collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    /// The query texts. Usually a single query; the contract allows a batch.
    pub texts: Vec<String>,

    /// Nearest neighbours to request per query text.
    pub limit: usize,

    /// Restrict results to documents whose type is in this set.
    /// Empty means no filter.
    #[serde(default)]
    pub document_types: Vec<String>,
}

impl RetrievalQuery {
    /// A single-text query with a document-type filter.
    pub fn single(
        text: impl Into<String>,
        limit: usize,
        document_types: Vec<String>,
    ) -> Self {
        Self {
            texts: vec![text.into()],
            limit,
            document_types,
        }
    }
}

/// A retrieved passage with its cosine distance from the query.
///
/// Ephemeral: produced per query, consumed immediately to build a context
/// string, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// The passage text
    pub text: String,

    /// Cosine distance (0 = identical, larger = less similar)
    pub distance: f32,
}

/// Query results, grouped per input query text.
///
/// `groups[i]` holds the passages for `texts[i]`, nearest first. The
/// parallel-array shape mirrors the collaborator's wire contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub groups: Vec<Vec<ScoredPassage>>,
}

impl RetrievalResult {
    /// Total passages across all groups.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }
}

/// The core VectorStore trait.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The store name (e.g., "chroma", "in_memory").
    fn name(&self) -> &str;

    /// Run a similarity search. An empty result set is a normal outcome,
    /// never an error.
    async fn query(
        &self,
        query: RetrievalQuery,
    ) -> std::result::Result<RetrievalResult, RetrievalError>;

    /// Upsert documents into the collection, delegating embedding
    /// computation to the store.
    async fn upsert(
        &self,
        documents: Vec<SopDocument>,
    ) -> std::result::Result<(), RetrievalError>;

    /// Number of documents in the collection.
    async fn count(&self) -> std::result::Result<usize, RetrievalError>;
}
