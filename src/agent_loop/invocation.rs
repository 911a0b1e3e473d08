//! The per-agent tool-calling loop.
//!
//! One invocation repeatedly asks the model for the next turn. Function calls
//! are executed against the agent's capabilities and fed back. The loop ends
//! at the first turn without function calls, on a blocked response, or when
//! the turn budget runs out (the last two end in an escalation event).

use std::sync::Arc;

use async_stream::try_stream;
use serde_json::json;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::error::{AgentreeError, ErrorCategory, Result};
use crate::provider::ModelRequest;
use crate::tools::{ToolArguments, ToolContext, ToolKind};
use crate::types::{Content, FunctionCall, FunctionResponse, Part, Role};

use super::events::Event;
use super::runner::{boxed, EventStream};
use super::types::InvocationContext;

/// Error code attached to escalations caused by the turn budget.
pub const MAX_TURNS_EXCEEDED: &str = "MAX_TURNS_EXCEEDED";
/// Error code attached to escalations caused by a refused prompt or response.
pub const RESPONSE_BLOCKED: &str = "RESPONSE_BLOCKED";

/// Run `agent` over `history`, yielding its events lazily.
///
/// Nothing happens until the stream is polled, and polling stops the work:
/// a consumer that drops the stream after the final event never pays for
/// later turns.
pub fn run_agent(
    agent: Arc<Agent>,
    history: Vec<Content>,
    ctx: InvocationContext,
) -> EventStream<'static> {
    boxed(try_stream! {
        let declarations = agent.tool_declarations();
        let max_turns = ctx.settings.max_turns;
        let mut contents = history;
        let mut turn = 0usize;
        let mut finished = false;

        while !finished && turn < max_turns {
            turn += 1;
            let request = ModelRequest {
                model: agent.model().to_string(),
                system_instruction: Some(agent.instruction().to_string()),
                contents: contents.clone(),
                tools: declarations.clone(),
                settings: ctx.settings.generation.clone(),
            };
            let response = ctx.provider.generate(&request).await?;
            debug!(
                agent = agent.name(),
                depth = ctx.depth,
                turn,
                parts = response.content.parts.len(),
                output_tokens = response.usage.output_tokens,
                "model turn complete"
            );

            if let Some(reason) = response.block_reason {
                warn!(agent = agent.name(), %reason, "model refused to answer");
                finished = true;
                yield Event::escalation(ctx.invocation_id, agent.name(), Some(reason))
                    .with_error_code(RESPONSE_BLOCKED);
                continue;
            }

            let calls: Vec<FunctionCall> =
                response.content.function_calls().into_iter().cloned().collect();
            yield Event::new(ctx.invocation_id, agent.name(), Some(response.content.clone()));

            if calls.is_empty() {
                finished = true;
                continue;
            }
            contents.push(response.content);

            let mut parts = Vec::with_capacity(calls.len());
            for call in &calls {
                let response = execute_call(&agent, call, &ctx).await?;
                parts.push(Part::FunctionResponse(response));
            }
            let responses = Content::new(Role::Function, parts);
            yield Event::new(ctx.invocation_id, agent.name(), Some(responses.clone()));
            contents.push(responses);
        }

        if !finished {
            warn!(agent = agent.name(), max_turns, "turn budget exhausted");
            yield Event::escalation(
                ctx.invocation_id,
                agent.name(),
                Some(format!("{} exceeded {} model turns", agent.name(), max_turns)),
            )
            .with_error_code(MAX_TURNS_EXCEEDED);
        }
    })
}

/// Execute one function call. Tool-level failures are reported back to the
/// model as an `error` response; anything else aborts the invocation.
async fn execute_call(
    agent: &Agent,
    call: &FunctionCall,
    ctx: &InvocationContext,
) -> Result<FunctionResponse> {
    let outcome = match agent.capability(&call.name) {
        None => Err(AgentreeError::tool(
            &call.name,
            format!("{} has no capability named '{}'", agent.name(), call.name),
        )),
        Some(tool) if tool.kind() == ToolKind::Builtin => Err(AgentreeError::tool(
            &call.name,
            "built-in tools are executed by the model service",
        )),
        Some(tool) => {
            let tool_ctx = ToolContext {
                invocation: ctx.clone(),
                function_call_id: call.id.clone(),
            };
            tool.execute(&ToolArguments::new(call.args.clone()), &tool_ctx).await
        }
    };

    let response = match outcome {
        Ok(value) => value,
        Err(e) if e.category() == ErrorCategory::ToolExecution => {
            warn!(agent = agent.name(), tool = %call.name, error = %e, "tool call failed");
            json!({ "error": e.to_string() })
        }
        Err(e) => return Err(e),
    };

    Ok(FunctionResponse {
        id: call.id.clone(),
        name: call.name.clone(),
        response,
    })
}
