//! Vector store collaborators and the context retriever for sopchat.
//!
//! The store holds SOP document snippets with embeddings; the retriever
//! turns a (possibly rewritten) user query into a labeled context block
//! by filtering retrieved passages through a cosine-distance cutoff.

pub mod chroma;
pub mod context;
pub mod distance;
pub mod embedder;
pub mod in_memory;

pub use chroma::ChromaStore;
pub use context::{ContextRetriever, NO_CONTEXT_SENTINEL};
pub use embedder::{Embedder, ProviderEmbedder};
pub use in_memory::InMemoryStore;
