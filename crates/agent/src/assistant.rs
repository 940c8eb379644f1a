//! The assistant facade: wires config, provider, retrieval, and
//! orchestration into a single chat surface.

use crate::orchestrator::Orchestrator;
use crate::rewrite::QueryRewriter;
use crate::session::{new_session, BudgetPolicy};
use sopchat_config::AppConfig;
use sopchat_core::error::{Error, Result};
use sopchat_core::message::Session;
use sopchat_core::provider::Provider;
use sopchat_core::retrieval::VectorStore;
use sopchat_core::tool::ToolRegistry;
use sopchat_retrieval::{ChromaStore, ContextRetriever, InMemoryStore, ProviderEmbedder};
use std::sync::Arc;
use tracing::info;

/// A single-user chat session over the SOP corpus.
///
/// Holds the session state, prunes it against the token budget before
/// each turn, rewrites follow-up queries, and runs the two-phase
/// completion for every prompt.
pub struct Assistant {
    session: Session,
    rewriter: QueryRewriter,
    orchestrator: Orchestrator,
    budget: BudgetPolicy,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("session", &self.session)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

impl Assistant {
    /// Build an assistant from configuration.
    ///
    /// Fails with `Error::MissingCredential` before any network call
    /// when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = sopchat_providers::from_config(config)?;

        let embedder = Arc::new(ProviderEmbedder::new(
            provider.clone(),
            config.embedding_model.clone(),
        ));
        let store: Arc<dyn VectorStore> = match config.retrieval.backend.as_str() {
            "chroma" => Arc::new(ChromaStore::new(
                config.retrieval.chroma_url.clone(),
                config.retrieval.collection.clone(),
                embedder,
            )),
            "in_memory" => Arc::new(InMemoryStore::new(embedder)),
            other => {
                return Err(Error::Config {
                    message: format!("Unknown retrieval backend '{other}'"),
                })
            }
        };

        let retriever = Arc::new(ContextRetriever::new(
            store,
            config.retrieval.distance_cutoff,
            config.retrieval.limit,
            config.retrieval.document_types.clone(),
        ));
        let registry = sopchat_tools::registry(retriever)?;

        Ok(Self::from_parts(provider, registry, config))
    }

    /// Assemble an assistant from already-built collaborators.
    pub fn from_parts(
        provider: Arc<dyn Provider>,
        registry: ToolRegistry,
        config: &AppConfig,
    ) -> Self {
        Self {
            session: new_session(&config.assistant),
            rewriter: QueryRewriter::new(provider.clone(), config.rewrite_model.clone()),
            orchestrator: Orchestrator::new(provider, registry, config.chat_model.clone()),
            budget: BudgetPolicy::from_config(&config.budget),
        }
    }

    /// Handle one user prompt and return the assistant's answer.
    pub async fn send(&mut self, prompt: &str) -> Result<String> {
        self.budget.prune(&mut self.session);

        self.rewriter
            .append_user_turn(&mut self.session, prompt)
            .await?;

        self.orchestrator.run_turn(&mut self.session).await
    }

    /// The current session, for rendering.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Record user feedback on the latest answer.
    ///
    /// Currently a logging stub; a real sink can hang off this seam.
    pub fn record_feedback(&self, thumbs_up: bool, comment: Option<&str>) {
        info!(
            session = %self.session.id,
            thumbs_up,
            comment = comment.unwrap_or(""),
            "Feedback recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{DEFAULT_GREETING, REWRITE_SENTINEL};
    use crate::test_helpers::{
        make_text_response, make_tool_call, make_tool_call_response, SequentialMockProvider,
    };
    use async_trait::async_trait;
    use sopchat_core::error::ToolError;
    use sopchat_core::message::Role;
    use sopchat_core::tool::{Tool, ToolResult};

    struct CannedContextTool {
        output: String,
    }

    #[async_trait]
    impl Tool for CannedContextTool {
        fn name(&self) -> &str {
            "get_relevant_context"
        }
        fn description(&self) -> &str {
            "Get related SOPs to use as context from the vector store"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
        ) -> std::result::Result<ToolResult, ToolError> {
            Ok(ToolResult {
                call_id: String::new(),
                output: self.output.clone(),
            })
        }
    }

    fn registry_with(output: &str) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CannedContextTool {
            output: output.into(),
        }));
        registry
    }

    #[test]
    fn from_config_without_key_fails_fast() {
        let config = AppConfig::default();
        let err = Assistant::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
    }

    #[test]
    fn from_config_rejects_unknown_backend() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.retrieval.backend = "postgres".into();
        let err = Assistant::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn fresh_session_starts_with_greeting() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let assistant = Assistant::from_parts(provider, registry_with(""), &AppConfig::default());

        let session = assistant.session();
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages[0].role, Role::System);
        assert_eq!(session.messages[1].content, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn first_prompt_skips_rewrite_and_tools_ground_the_answer() {
        // Seeded session has 2 messages, so the first prompt goes in raw.
        // The model requests retrieval, the tool result lands on the
        // session, and the grounded phase produces the answer.
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call(
                "get_relevant_context",
                serde_json::json!({"query": "refund policy"}),
            )],
            "Refunds take 30 days per SOP 12.",
        ));
        let mut assistant = Assistant::from_parts(
            provider.clone(),
            registry_with("refund SOP text"),
            &AppConfig::default(),
        );

        let answer = assistant.send("What is the refund policy?").await.unwrap();

        assert_eq!(answer, "Refunds take 30 days per SOP 12.");
        // Two completions, no rewrite call
        assert_eq!(provider.call_count(), 2);

        let session = assistant.session();
        // system, greeting, user, assistant(tool_calls), tool, assistant
        assert_eq!(session.len(), 6);
        assert!(session
            .messages
            .iter()
            .any(|m| m.role == Role::Tool && m.content == "refund SOP text"));
        assert_eq!(
            session.messages.last().unwrap().content,
            "Refunds take 30 days per SOP 12."
        );
    }

    #[tokio::test]
    async fn follow_up_prompt_is_rewritten_first() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            // Turn 1: tool-eligible (discarded) + grounded
            make_text_response("discarded"),
            make_text_response("Refunds take 30 days."),
            // Turn 2: rewrite, then the two phases
            make_text_response("refund policy for group bookings"),
            make_tool_call_response(vec![make_tool_call(
                "get_relevant_context",
                serde_json::json!({"query": "refund policy for group bookings"}),
            )]),
            make_text_response("Group refunds take 45 days."),
        ]));
        let mut assistant = Assistant::from_parts(
            provider.clone(),
            registry_with("group refund SOP"),
            &AppConfig::default(),
        );

        assistant.send("What is the refund policy?").await.unwrap();
        let answer = assistant.send("what about groups?").await.unwrap();

        assert_eq!(answer, "Group refunds take 45 days.");
        assert_eq!(provider.call_count(), 5);

        let session = assistant.session();
        assert!(session
            .messages
            .iter()
            .any(|m| m.content.starts_with(REWRITE_SENTINEL)));
    }

    #[tokio::test]
    async fn oversized_history_is_pruned_before_the_turn() {
        let mut config = AppConfig::default();
        config.budget.context_window = 400;

        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("rewritten query"),
            make_text_response("discarded"),
            make_text_response("answer"),
        ]));
        let mut assistant =
            Assistant::from_parts(provider, registry_with(""), &config);

        // Inflate the session past the 380-token threshold
        for _ in 0..5 {
            assistant
                .session
                .push(sopchat_core::message::Message::user("x".repeat(400)));
        }
        let before = assistant.session.len();

        assistant.send("follow-up question").await.unwrap();
        assert!(assistant.session.len() < before + 2);
    }
}
