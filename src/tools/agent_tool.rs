//! Delegation adapter: exposes an [`Agent`] as a capability of another agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info_span, Instrument};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolContext};
use super::types::ToolParameters;
use crate::agent::Agent;
use crate::agent_loop::invocation::run_agent;
use crate::driver::{drain_final_response, FinalResponse};
use crate::error::AgentreeError;
use crate::types::Content;

/// Name of the single argument the model passes to a delegated agent.
pub const REQUEST_ARG: &str = "request";

/// Wraps exactly one agent. The wrapped agent is shared, never mutated, and
/// runs in its own isolated conversation each time it is called.
#[derive(Debug, Clone)]
pub struct AgentTool {
    agent: Arc<Agent>,
}

impl AgentTool {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        self.agent.name()
    }

    fn description(&self) -> &str {
        self.agent.description()
    }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
            .string(REQUEST_ARG, "The task or question for this agent.", true)
            .build()
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, AgentreeError> {
        let request = args.get_str(REQUEST_ARG)?.to_string();
        let child = ctx.invocation.delegate(self.agent.name())?;
        let span = info_span!("delegate", agent = self.agent.name(), depth = child.depth);

        async {
            debug!(call_id = %ctx.function_call_id, "running delegated agent");
            let stream = run_agent(self.agent.clone(), vec![Content::user_text(request)], child);
            match drain_final_response(stream).await? {
                FinalResponse::Text(text) => Ok(json!({ "result": text })),
                FinalResponse::NoResponse => Ok(json!({ "result": "" })),
                escalated @ FinalResponse::Escalated(_) => {
                    Ok(json!({ "error": escalated.to_string() }))
                }
            }
        }
        .instrument(span)
        .await
    }
}
