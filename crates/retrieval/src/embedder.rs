//! Embedding delegation.
//!
//! The vector store does not compute embeddings itself; it hands text to
//! an `Embedder`. In production that is the provider's embedding endpoint
//! (the same collaborator that serves completions); tests substitute a
//! deterministic stub.

use async_trait::async_trait;
use sopchat_core::error::RetrievalError;
use sopchat_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;

/// Turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;
}

/// An `Embedder` backed by a `Provider`'s embedding endpoint.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != texts.len() {
            return Err(RetrievalError::EmbeddingFailed(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sopchat_core::error::ProviderError;
    use sopchat_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    struct FixedEmbeddingProvider {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl Provider for FixedEmbeddingProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            unreachable!("embedding-only provider")
        }

        async fn embed(
            &self,
            _request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: self.vectors.clone(),
                model: "text-embedding-3-small".into(),
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn delegates_to_provider() {
        let provider = Arc::new(FixedEmbeddingProvider {
            vectors: vec![vec![1.0, 0.0]],
        });
        let embedder = ProviderEmbedder::new(provider, "text-embedding-3-small");
        let result = embedder.embed(&["refund policy".into()]).await.unwrap();
        assert_eq!(result, vec![vec![1.0, 0.0]]);
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let provider = Arc::new(FixedEmbeddingProvider {
            vectors: vec![vec![1.0, 0.0]],
        });
        let embedder = ProviderEmbedder::new(provider, "text-embedding-3-small");
        let err = embedder
            .embed(&["one".into(), "two".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingFailed(_)));
    }
}
