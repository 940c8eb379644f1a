//! The context retriever: similarity search + distance cutoff + formatting.
//!
//! Turns a search query into either a labeled context block of relevant
//! SOP passages or the `NO RELEVANT CONTEXT FOUND` sentinel. An empty
//! result set is a normal, expected branch, never an error.

use sopchat_core::error::RetrievalError;
use sopchat_core::retrieval::{RetrievalQuery, VectorStore};
use std::sync::Arc;
use tracing::debug;

/// Returned when no passage survives the distance cutoff.
pub const NO_CONTEXT_SENTINEL: &str = "NO RELEVANT CONTEXT FOUND";

const CONTEXT_HEADER: &str =
    "You may use the following SOP Documents (in json format) to answer the question:";

/// Retrieves SOP passages relevant to a query and formats them as a
/// context block for the grounded completion phase.
pub struct ContextRetriever {
    store: Arc<dyn VectorStore>,
    distance_cutoff: f32,
    default_limit: usize,
    document_types: Vec<String>,
}

impl ContextRetriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        distance_cutoff: f32,
        default_limit: usize,
        document_types: Vec<String>,
    ) -> Self {
        Self {
            store,
            distance_cutoff,
            default_limit,
            document_types,
        }
    }

    /// The default result limit, used when the model omits one.
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Retrieve context for a single query.
    ///
    /// Requests `limit` nearest neighbours, discards passages with a
    /// distance above the cutoff, and joins the survivors into a labeled
    /// context block. Passages from every result group are merged; with a
    /// single-query batch there is only one group, but a batched store
    /// response must not silently lose earlier groups.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<String, RetrievalError> {
        let result = self
            .store
            .query(RetrievalQuery::single(
                query,
                limit,
                self.document_types.clone(),
            ))
            .await?;

        let surviving: Vec<String> = result
            .groups
            .into_iter()
            .flatten()
            .filter(|passage| passage.distance <= self.distance_cutoff)
            .map(|passage| passage.text)
            .collect();

        debug!(
            query = %query,
            surviving = surviving.len(),
            cutoff = self.distance_cutoff,
            "Context retrieval complete"
        );

        if surviving.is_empty() {
            return Ok(NO_CONTEXT_SENTINEL.to_string());
        }

        Ok(format!("{CONTEXT_HEADER}\n{}", surviving.join("\n")))
    }
}
