//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::agent_loop::InvocationContext;
use crate::error::AgentreeError;
use crate::provider::ToolDeclaration;

/// Where a tool runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Declared as a function; executed locally when the model calls it.
    Function,
    /// Provided by the model service (e.g. grounding search); never executed locally.
    Builtin,
}

/// Context available during tool execution.
#[derive(Clone)]
pub struct ToolContext {
    /// The invocation the call belongs to.
    pub invocation: InvocationContext,
    pub function_call_id: String,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("invocation_id", &self.invocation.invocation_id)
            .field("depth", &self.invocation.depth)
            .field("function_call_id", &self.function_call_id)
            .finish()
    }
}

/// A capability an agent can invoke: a leaf action or another agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description, shown to the model.
    fn description(&self) -> &str;

    fn kind(&self) -> ToolKind {
        ToolKind::Function
    }

    /// JSON Schema parameters.
    fn parameters(&self) -> ToolParameters {
        ToolParameters::empty()
    }

    /// Execute the tool with parsed arguments.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, AgentreeError>;

    /// How this tool is declared to the model.
    fn declaration(&self) -> ToolDeclaration {
        match self.kind() {
            ToolKind::Function => ToolDeclaration::Function {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters().schema,
            },
            ToolKind::Builtin => ToolDeclaration::Builtin {
                name: self.name().to_string(),
            },
        }
    }
}

type ToolHandler = dyn Fn(
        ToolArguments,
        ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, AgentreeError>> + Send>>
    + Send
    + Sync;

/// Closure-based leaf tool.
pub struct FnTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, AgentreeError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> ToolParameters {
        self.parameters.clone()
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, AgentreeError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
