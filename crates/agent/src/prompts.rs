//! Prompt text for the SOP assistant.
//!
//! The system prompt pins the assistant to the retrieved SOP corpus and
//! names the retrieval capability it may call. The rewrite prompt turns
//! a follow-up question plus conversation history into a standalone
//! search query.

/// Marker prefixed to rewritten queries appended to the session.
///
/// Rendering layers hide messages carrying this marker; the completion
/// endpoint still sees them.
pub const REWRITE_SENTINEL: &str = "QUERY_CLEAN";

pub const DEFAULT_GREETING: &str = "How can I help you? Leave feedback to help me improve!";

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
As a travel agent assistant for Major Travel, your role involves strictly adhering to the agency's standard operating procedures (SOPs) and internal tasks to ensure high-quality service delivery. Your primary objective is to support senior colleagues in identifying the most relevant references based on company SOPs and assisting them with their daily tasks.

If the requested information is not found in the provided documents, you have three options:
1. If it's the initial query and you lack specific details to provide a precise answer, ask the user for additional information to better address their query.
2. For follow-up queries where the current chat context is insufficient, inform the user that the current context cannot adequately address their query and utilize the function `get_relevant_context` to search for more relevant SOPs.
3. If there is no relevant context found, simply say that the information cannot be found within the company's SOPs.

Answer ONLY with the facts extracted from the vector database. If there isn't enough information, say you don't know. Do not generate answers that don't use the sources provided to you. If asking a clarifying question to the user would help, ask the question.";

/// Build the query-rewriting prompt from the conversation history and
/// the user's new question.
pub fn rewrite_prompt(history: &[String], new_query: &str) -> String {
    format!(
        "Below is a history of the conversation so far, and a new question asked by the user \
that needs to be answered by searching in a vector database.
You have access to the company's vector database containing different Standard Order of Operations (SOPs).
Generate a new query based on the conversation and the new question while retaining as much information as possible.
Do not include cited source filenames and document names e.g info.txt or doc.pdf in the search query terms.
Do not include any special characters like '+'.

=== HISTORY OF CONVERSATION ===
{history:?}

=== NEW QUERY ===
{new_query}"
    )
}
