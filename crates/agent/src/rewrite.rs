//! Query rewriting for follow-up questions.
//!
//! Once a conversation has history beyond the seeded system prompt and
//! greeting, the raw user prompt is usually a poor search query ("what
//! about groups?"). The rewriter asks a stronger model to fold the
//! history into a standalone query, then appends it to the session as a
//! hidden marker message alongside the user's original prompt.

use crate::prompts::{rewrite_prompt, REWRITE_SENTINEL};
use sopchat_core::error::ProviderError;
use sopchat_core::message::{Message, Session};
use sopchat_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// Sessions at or above this length get their queries rewritten.
/// Below it the conversation is just the seeded system prompt and
/// greeting, so the raw prompt is already standalone.
const MIN_HISTORY_LEN: usize = 3;

pub struct QueryRewriter {
    provider: Arc<dyn Provider>,
    model: String,
}

impl QueryRewriter {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Whether this session has enough history to warrant a rewrite.
    pub fn should_rewrite(session: &Session) -> bool {
        session.len() >= MIN_HISTORY_LEN
    }

    /// Rewrite `prompt` into a standalone query using the session history.
    pub async fn rewrite(
        &self,
        session: &Session,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let history: Vec<String> = session
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect();

        let request = ProviderRequest::grounded(
            self.model.clone(),
            vec![Message::user(rewrite_prompt(&history, prompt))],
        );
        let response = self.provider.complete(request).await?;

        debug!(rewritten = %response.message.content, "Query rewritten");
        Ok(response.message.content)
    }

    /// Append the user's turn to the session, rewriting when the history
    /// warrants it. The original prompt always lands on the session; a
    /// rewrite adds a second, marker-prefixed user message that rendering
    /// layers hide.
    pub async fn append_user_turn(
        &self,
        session: &mut Session,
        prompt: &str,
    ) -> Result<(), ProviderError> {
        if !Self::should_rewrite(session) {
            session.push(Message::user(prompt));
            return Ok(());
        }

        let rewritten = self.rewrite(session, prompt).await?;
        session.push(Message::user(prompt));
        session.push(Message::user(format!("{REWRITE_SENTINEL}\n{rewritten}")));
        Ok(())
    }
}
