//! Capabilities the model can invoke during the tool-eligible phase.
//!
//! The registry is a closed mapping: it holds exactly the capabilities
//! the orchestrator expects, and `registry()` validates at build time
//! that every required name is present.

pub mod sop_context;

pub use sop_context::SopContextTool;

use sopchat_core::error::ToolError;
use sopchat_core::tool::ToolRegistry;
use sopchat_retrieval::ContextRetriever;
use std::sync::Arc;

/// Capability names the orchestrator depends on.
pub const REQUIRED_TOOLS: &[&str] = &[sop_context::TOOL_NAME];

/// Build the tool registry for a chat session, validated at startup.
pub fn registry(retriever: Arc<ContextRetriever>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SopContextTool::new(retriever)));
    registry.validate(REQUIRED_TOOLS)?;
    Ok(registry)
}
