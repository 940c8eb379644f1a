//! `get_relevant_context` — the retrieval capability exposed to the model.
//!
//! When the model decides the current chat context cannot answer the
//! question, it calls this tool with a search query (and optionally a
//! result limit); the output is either a labeled context block of SOP
//! passages or the no-context sentinel.

use async_trait::async_trait;
use sopchat_core::error::ToolError;
use sopchat_core::tool::{Tool, ToolResult};
use sopchat_retrieval::ContextRetriever;
use std::sync::Arc;
use tracing::debug;

pub const TOOL_NAME: &str = "get_relevant_context";

pub struct SopContextTool {
    retriever: Arc<ContextRetriever>,
}

impl SopContextTool {
    pub fn new(retriever: Arc<ContextRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for SopContextTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get related SOPs to use as context from the vector store"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Query passed by the user to the chatbot"
                },
                "limit": {
                    "type": "integer",
                    "description": "Total number of SOPs to retrieve from the vector database"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let limit = arguments["limit"]
            .as_u64()
            .map(|l| l as usize)
            .unwrap_or_else(|| self.retriever.default_limit());

        debug!(query = %query, limit, "Dispatching context retrieval");

        let output = self
            .retriever
            .retrieve(query, limit)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult {
            call_id: String::new(),
            output,
        })
    }
}
