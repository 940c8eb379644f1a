//! LLM provider implementations for sopchat.
//!
//! The only backend is the OpenAI-compatible chat completion API, which
//! also serves the embedding endpoint the vector store delegates to.

pub mod openai;

pub use openai::OpenAiProvider;

use sopchat_config::AppConfig;
use sopchat_core::Error;
use std::sync::Arc;

/// Build the configured provider.
///
/// This is the credential gate: when no API key is configured the turn
/// must halt before any network call, so construction fails with
/// `MissingCredential`. A blank key counts as absent.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn sopchat_core::Provider>, Error> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(Error::MissingCredential)?;
    Ok(Arc::new(OpenAiProvider::new(&config.api_url, api_key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_halts_before_any_network_call() {
        let config = AppConfig::default();
        assert!(!config.has_api_key());
        let err = from_config(&config).unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
    }

    #[test]
    fn blank_key_halts_before_any_network_call() {
        for blank in ["", "   "] {
            let config = AppConfig {
                api_key: Some(blank.into()),
                ..AppConfig::default()
            };
            let err = from_config(&config).unwrap_err();
            assert!(matches!(err, Error::MissingCredential));
        }
    }

    #[test]
    fn configured_key_builds_provider() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        let provider = from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
