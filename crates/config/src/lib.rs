//! Configuration loading, validation, and management for sopchat.
//!
//! Loads configuration from `~/.sopchat/config.toml` (overridable via
//! `SOPCHAT_CONFIG`) with environment variable overrides for secrets.
//! Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.sopchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OpenAI API key. Absence blocks all LLM calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for the tool-eligible and grounded completion phases
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for query rewriting
    #[serde(default = "default_rewrite_model")]
    pub rewrite_model: String,

    /// Model used for embedding queries and documents
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Token budget configuration
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Assistant identity configuration
    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_rewrite_model() -> String {
    "gpt-4".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("chat_model", &self.chat_model)
            .field("rewrite_model", &self.rewrite_model)
            .field("embedding_model", &self.embedding_model)
            .field("retrieval", &self.retrieval)
            .field("budget", &self.budget)
            .field("assistant", &self.assistant)
            .finish()
    }
}

/// Vector store and context retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Store backend: "chroma" or "in_memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base URL of the Chroma server (ignored for in_memory)
    #[serde(default = "default_chroma_url")]
    pub chroma_url: String,

    /// Name of the SOP collection
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Document types eligible for retrieval
    #[serde(default = "default_document_types")]
    pub document_types: Vec<String>,

    /// Maximum cosine distance for a passage to count as relevant
    #[serde(default = "default_distance_cutoff")]
    pub distance_cutoff: f32,

    /// Default number of nearest neighbours to request
    #[serde(default = "default_retrieval_limit")]
    pub limit: usize,
}

fn default_backend() -> String {
    "chroma".into()
}
fn default_chroma_url() -> String {
    "http://localhost:8000".into()
}
fn default_collection() -> String {
    "sop_documents".into()
}
fn default_document_types() -> Vec<String> {
    vec!["truncated".into(), "complete".into()]
}
fn default_distance_cutoff() -> f32 {
    0.6
}
fn default_retrieval_limit() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            chroma_url: default_chroma_url(),
            collection: default_collection(),
            document_types: default_document_types(),
            distance_cutoff: default_distance_cutoff(),
            limit: default_retrieval_limit(),
        }
    }
}

/// Token budget settings for session pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Model context window, in tokens
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Fraction of the context window at which pruning kicks in
    #[serde(default = "default_prune_ratio")]
    pub prune_ratio: f32,

    /// Whether the system message is exempt from pruning.
    /// The reference behavior is `false`: under budget pressure the system
    /// message goes like any other.
    #[serde(default)]
    pub preserve_system: bool,
}

fn default_context_window() -> usize {
    8192
}
fn default_prune_ratio() -> f32 {
    0.95
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            prune_ratio: default_prune_ratio(),
            preserve_system: false,
        }
    }
}

/// Assistant identity: prompt and greeting overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Override the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Override the built-in greeting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.sopchat/config.toml),
    /// or from the path named by `SOPCHAT_CONFIG` when set.
    ///
    /// The API key may also come from the `OPENAI_API_KEY` environment
    /// variable (config file takes precedence).
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::resolve_path(std::env::var("SOPCHAT_CONFIG").ok());
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_override(std::env::var("OPENAI_API_KEY").ok());
        Ok(config)
    }

    /// Resolve the config file path, honoring an override from
    /// `SOPCHAT_CONFIG` when set.
    fn resolve_path(override_path: Option<String>) -> PathBuf {
        match override_path {
            Some(path) => PathBuf::from(path),
            None => Self::config_dir().join("config.toml"),
        }
    }

    /// Fill in the API key from the environment when the config file
    /// carries none. The file takes precedence; blank values count as
    /// absent.
    pub fn apply_env_override(&mut self, api_key: Option<String>) {
        if self.api_key.is_none() {
            self.api_key = api_key.filter(|k| !k.trim().is_empty());
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sopchat")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.budget.prune_ratio) {
            return Err(ConfigError::ValidationError(
                "budget.prune_ratio must be between 0.0 and 1.0".into(),
            ));
        }

        if self.budget.context_window == 0 {
            return Err(ConfigError::ValidationError(
                "budget.context_window must be greater than zero".into(),
            ));
        }

        if self.retrieval.distance_cutoff < 0.0 {
            return Err(ConfigError::ValidationError(
                "retrieval.distance_cutoff must not be negative".into(),
            ));
        }

        if self.retrieval.limit == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.limit must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            chat_model: default_chat_model(),
            rewrite_model: default_rewrite_model(),
            embedding_model: default_embedding_model(),
            retrieval: RetrievalConfig::default(),
            budget: BudgetConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.budget.context_window, 8192);
        assert!((config.budget.prune_ratio - 0.95).abs() < f32::EPSILON);
        assert!((config.retrieval.distance_cutoff - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.limit, 3);
        assert!(!config.budget.preserve_system);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.chat_model, config.chat_model);
        assert_eq!(parsed.retrieval.collection, config.retrieval.collection);
    }

    #[test]
    fn invalid_prune_ratio_rejected() {
        let config = AppConfig {
            budget: BudgetConfig {
                prune_ratio: 1.5,
                ..BudgetConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retrieval_limit_rejected() {
        let config = AppConfig {
            retrieval: RetrievalConfig {
                limit: 0,
                ..RetrievalConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().chat_model, "gpt-3.5-turbo");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
api_key = "sk-test"

[retrieval]
collection = "sop_major_travel"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.retrieval.collection, "sop_major_travel");
        // Unspecified fields keep defaults
        assert_eq!(config.retrieval.document_types, vec!["truncated", "complete"]);
        assert_eq!(config.rewrite_model, "gpt-4");
    }

    #[test]
    fn env_key_fills_in_when_file_has_none() {
        let mut config = AppConfig::default();
        config.apply_env_override(Some("sk-from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("sk-from-env"));
    }

    #[test]
    fn file_key_takes_precedence_over_env() {
        let mut config = AppConfig {
            api_key: Some("sk-from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_override(Some("sk-from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("sk-from-file"));
    }

    #[test]
    fn blank_env_key_counts_as_absent() {
        let mut config = AppConfig::default();
        config.apply_env_override(Some("   ".into()));
        assert!(config.api_key.is_none());

        config.apply_env_override(Some(String::new()));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn config_path_override_wins() {
        let path = AppConfig::resolve_path(Some("/etc/sopchat/custom.toml".into()));
        assert_eq!(path, PathBuf::from("/etc/sopchat/custom.toml"));

        let default_path = AppConfig::resolve_path(None);
        assert!(default_path.ends_with(".sopchat/config.toml"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-3.5-turbo"));
        assert!(toml_str.contains("sop_documents"));
        // No key means nothing secret to emit
        assert!(!toml_str.contains("api_key"));
    }
}
