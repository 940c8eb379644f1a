//! Token estimation for session pruning.
//!
//! Uses a character-based heuristic: ~4 characters per token, accurate
//! within ~10% for BPE tokenizers on English text. The per-message
//! accounting mirrors the OpenAI chat wire format: every message costs a
//! fixed overhead for role name and delimiters, plus the encoded length
//! of each field it actually carries.

use sopchat_core::message::Message;

/// Per-message overhead for role name, delimiters, and format markers.
const MESSAGE_OVERHEAD: usize = 4;

/// Fixed overhead for the conversation as a whole (priming tokens).
const CONVERSATION_OVERHEAD: usize = 2;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() + 3) / 4
}

/// Estimate tokens for a single message.
///
/// Each present field value (role, content, name, tool_call_id) is
/// encoded separately. A `name` field replaces the role in the wire
/// format, so its presence credits one token back.
///
/// Assistant messages carrying tool calls do not map onto the flat
/// field accounting; those fall back to encoding the whole serialized
/// message.
pub fn estimate_message_tokens(message: &Message) -> usize {
    if !message.tool_calls.is_empty() {
        let serialized = serde_json::to_string(message).unwrap_or_default();
        return MESSAGE_OVERHEAD + estimate_tokens(&serialized);
    }

    let mut tokens = MESSAGE_OVERHEAD;
    tokens += estimate_tokens(message.role.as_str());
    tokens += estimate_tokens(&message.content);
    if let Some(tool_call_id) = &message.tool_call_id {
        tokens += estimate_tokens(tool_call_id);
    }
    if let Some(name) = &message.name {
        tokens += estimate_tokens(name);
        tokens -= 1;
    }
    tokens
}

/// Estimate tokens for an ordered message sequence, including the
/// fixed conversation overhead.
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    let per_message: usize = messages.iter().map(estimate_message_tokens).sum();
    per_message + CONVERSATION_OVERHEAD
}
