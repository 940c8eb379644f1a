//! Session management, query rewriting, and completion orchestration.
//!
//! The flow for one user turn:
//!
//! 1. [`session::BudgetPolicy`] prunes the oldest messages while the
//!    token estimate exceeds the budget.
//! 2. [`rewrite::QueryRewriter`] folds the history into a standalone
//!    search query once the conversation has real history.
//! 3. [`orchestrator::Orchestrator`] runs the tool-eligible completion,
//!    dispatches any requested retrieval, then runs the grounded
//!    completion that produces the answer.
//!
//! [`assistant::Assistant`] wires all of it together behind one `send`.

pub mod assistant;
pub mod orchestrator;
pub mod prompts;
pub mod rewrite;
pub mod session;
pub mod token;

#[cfg(test)]
mod test_helpers;

pub use assistant::Assistant;
pub use orchestrator::Orchestrator;
pub use rewrite::QueryRewriter;
pub use session::{new_session, BudgetPolicy};
