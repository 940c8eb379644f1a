//! # sopchat Core
//!
//! Domain types, traits, and error definitions for the sopchat SOP assistant.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The external collaborators (LLM completion endpoint, vector store) are
//! defined as traits here. Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, Session, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice};
pub use retrieval::{RetrievalQuery, RetrievalResult, ScoredPassage, SopDocument, VectorStore};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
