//! `sopchat search` — One-shot context retrieval, without the chat loop.

use sopchat_config::AppConfig;
use sopchat_core::retrieval::VectorStore;
use sopchat_retrieval::{ChromaStore, ContextRetriever, InMemoryStore, ProviderEmbedder};
use std::sync::Arc;

pub async fn run(query: &str, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let provider = sopchat_providers::from_config(&config)?;
    let embedder = Arc::new(ProviderEmbedder::new(
        provider,
        config.embedding_model.clone(),
    ));

    let store: Arc<dyn VectorStore> = match config.retrieval.backend.as_str() {
        "chroma" => Arc::new(ChromaStore::new(
            config.retrieval.chroma_url.clone(),
            config.retrieval.collection.clone(),
            embedder,
        )),
        "in_memory" => Arc::new(InMemoryStore::new(embedder)),
        other => return Err(format!("Unknown retrieval backend '{other}'").into()),
    };

    let retriever = ContextRetriever::new(
        store,
        config.retrieval.distance_cutoff,
        config.retrieval.limit,
        config.retrieval.document_types.clone(),
    );

    let limit = limit.unwrap_or_else(|| retriever.default_limit());
    let context = retriever.retrieve(query, limit).await?;
    println!("{context}");

    Ok(())
}
