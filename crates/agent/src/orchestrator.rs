//! The two-phase completion orchestrator.
//!
//! Every user turn runs two completions at temperature zero:
//!
//! 1. A tool-eligible call with the registry's definitions exposed and
//!    tool selection left to the model. If the model requests tool
//!    calls, the assistant message and each tool result are appended to
//!    the session.
//! 2. A grounded call with no tool access, whose single choice is the
//!    answer for the turn.
//!
//! The grounded call always runs, whether or not the first phase used a
//! tool. When no tool was requested, the first response is discarded so
//! the answer is always produced without tool access.

use sopchat_core::error::Error;
use sopchat_core::message::{Message, Session};
use sopchat_core::provider::{Provider, ProviderRequest};
use sopchat_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    registry: ToolRegistry,
    model: String,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, registry: ToolRegistry, model: impl Into<String>) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
        }
    }

    /// Run one turn against the session and return the answer.
    ///
    /// The session must already carry the user's prompt (and any marker
    /// message the rewriter added). A request for an unregistered tool
    /// name aborts the turn with `ToolError::NotFound`; on any dispatch
    /// failure the session is rolled back to its pre-dispatch state, so
    /// no assistant tool-call message is left without its paired tool
    /// results.
    pub async fn run_turn(&self, session: &mut Session) -> Result<String, Error> {
        let tool_request = ProviderRequest::tool_eligible(
            self.model.clone(),
            session.messages.clone(),
            self.registry.definitions(),
        );
        let tool_response = self.provider.complete(tool_request).await?;

        let tool_calls = tool_response.message.tool_calls.clone();
        if tool_calls.is_empty() {
            debug!("Model answered without tool calls");
        } else {
            info!(count = tool_calls.len(), "Dispatching tool calls");
            let checkpoint = session.len();
            session.push(tool_response.message);

            if let Err(e) = self.dispatch_tool_calls(session, &tool_calls).await {
                session.messages.truncate(checkpoint);
                return Err(e);
            }
        }

        let grounded_request =
            ProviderRequest::grounded(self.model.clone(), session.messages.clone());
        let grounded_response = self.provider.complete(grounded_request).await?;

        let answer = grounded_response.message.content;
        session.push(Message::assistant(answer.clone()));
        Ok(answer)
    }

    /// Execute each requested call and append its result to the session.
    async fn dispatch_tool_calls(
        &self,
        session: &mut Session,
        tool_calls: &[sopchat_core::message::MessageToolCall],
    ) -> Result<(), Error> {
        for call in tool_calls {
            let arguments = match serde_json::from_str(&call.arguments) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        tool = %call.name,
                        error = %e,
                        "Malformed tool-call arguments, using empty object"
                    );
                    serde_json::Value::Object(serde_json::Map::new())
                }
            };

            let result = self
                .registry
                .execute(&ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                })
                .await?;

            session.push(Message::tool_result(
                result.call_id,
                call.name.clone(),
                result.output,
            ));
        }
        Ok(())
    }
}
