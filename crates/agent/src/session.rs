//! Session seeding and the token budget pruning policy.

use crate::prompts::{DEFAULT_GREETING, DEFAULT_SYSTEM_PROMPT};
use crate::token::estimate_messages_tokens;
use sopchat_config::{AssistantConfig, BudgetConfig};
use sopchat_core::message::{Message, Role, Session};
use tracing::debug;

/// Seed a new session with the system prompt and the assistant greeting.
pub fn new_session(assistant: &AssistantConfig) -> Session {
    let system_prompt = assistant
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let greeting = assistant.greeting.as_deref().unwrap_or(DEFAULT_GREETING);

    let mut session = Session::new();
    session.push(Message::system(system_prompt));
    session.push(Message::assistant(greeting));
    session
}

/// Decides when a session exceeds its token budget and trims it back.
///
/// Pruning removes the oldest messages first until the estimate drops
/// below the threshold. With `preserve_system` set, a leading system
/// message is exempt and removal starts from the next-oldest message.
#[derive(Debug, Clone)]
pub struct BudgetPolicy {
    context_window: usize,
    prune_ratio: f32,
    preserve_system: bool,
}

impl BudgetPolicy {
    pub fn new(context_window: usize, prune_ratio: f32, preserve_system: bool) -> Self {
        Self {
            context_window,
            prune_ratio,
            preserve_system,
        }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(
            config.context_window,
            config.prune_ratio,
            config.preserve_system,
        )
    }

    /// The token count at which pruning kicks in.
    pub fn threshold(&self) -> usize {
        (self.context_window as f32 * self.prune_ratio) as usize
    }

    /// Trim the oldest messages until the session fits the budget.
    /// Returns the number of messages removed.
    pub fn prune(&self, session: &mut Session) -> usize {
        let threshold = self.threshold();
        let mut removed = 0;

        while estimate_messages_tokens(&session.messages) >= threshold {
            let exempt_leading_system = self.preserve_system
                && session
                    .messages
                    .first()
                    .is_some_and(|m| m.role == Role::System);

            let popped = if exempt_leading_system {
                if session.len() <= 1 {
                    break;
                }
                session.updated_at = chrono::Utc::now();
                Some(session.messages.remove(1))
            } else {
                session.pop_oldest()
            };

            match popped {
                Some(message) => {
                    debug!(role = message.role.as_str(), "Pruned message over token budget");
                    removed += 1;
                }
                None => break,
            }
        }

        if removed > 0 {
            debug!(
                removed,
                remaining = session.len(),
                tokens = estimate_messages_tokens(&session.messages),
                "Session pruned"
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_system_then_greeting() {
        let session = new_session(&AssistantConfig::default());
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages[0].role, Role::System);
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(session.messages[1].content, DEFAULT_GREETING);
    }

    #[test]
    fn new_session_honors_overrides() {
        let assistant = AssistantConfig {
            system_prompt: Some("custom rules".into()),
            greeting: Some("custom hello".into()),
        };
        let session = new_session(&assistant);
        assert_eq!(session.messages[0].content, "custom rules");
        assert_eq!(session.messages[1].content, "custom hello");
    }

    #[test]
    fn prune_leaves_small_sessions_alone() {
        let policy = BudgetPolicy::new(8192, 0.95, false);
        let mut session = new_session(&AssistantConfig::default());
        session.push(Message::user("What is the refund policy?"));

        assert_eq!(policy.prune(&mut session), 0);
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn prune_removes_oldest_first() {
        // Each long user message is ~105 tokens; a threshold of 114
        // forces the three-message session down to one.
        let policy = BudgetPolicy::new(120, 0.95, false);
        let mut session = Session::new();
        session.push(Message::user("a".repeat(400)));
        session.push(Message::user("b".repeat(400)));
        session.push(Message::user("keep me"));

        let removed = policy.prune(&mut session);
        assert_eq!(removed, 2);
        assert_eq!(session.len(), 1);
        assert_eq!(session.messages[0].content, "keep me");
    }

    #[test]
    fn prune_removes_system_message_by_default() {
        let policy = BudgetPolicy::new(120, 0.95, false);
        let mut session = Session::new();
        session.push(Message::system("s".repeat(400)));
        session.push(Message::user("recent question"));

        policy.prune(&mut session);
        assert!(session.messages.iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn preserve_system_skips_leading_system_message() {
        let policy = BudgetPolicy::new(120, 0.95, true);
        let mut session = Session::new();
        session.push(Message::system("the rules"));
        session.push(Message::user("u".repeat(400)));
        session.push(Message::user("recent question"));

        policy.prune(&mut session);
        assert_eq!(session.messages[0].role, Role::System);
        assert!(session
            .messages
            .iter()
            .all(|m| m.content != "u".repeat(400)));
    }

    #[test]
    fn preserve_system_never_loops_on_lone_system_message() {
        // A single oversized system message cannot be pruned away when it
        // is exempt; the loop must bail out rather than spin.
        let policy = BudgetPolicy::new(10, 0.5, true);
        let mut session = Session::new();
        session.push(Message::system("s".repeat(400)));

        assert_eq!(policy.prune(&mut session), 0);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn prune_terminates_on_empty_session() {
        let policy = BudgetPolicy::new(1, 0.5, false);
        let mut session = Session::new();
        assert_eq!(policy.prune(&mut session), 0);
    }

    #[test]
    fn post_prune_estimate_is_under_threshold() {
        let policy = BudgetPolicy::new(300, 0.95, false);
        let mut session = Session::new();
        for _ in 0..10 {
            session.push(Message::user("x".repeat(200)));
        }

        policy.prune(&mut session);
        assert!(estimate_messages_tokens(&session.messages) < policy.threshold());
    }
}
