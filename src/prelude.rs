//! Convenience re-exports for common use.

pub use crate::agent::{
    Agent, AgentSpec, InMemorySessionService, Session, SessionKey, SessionService, Topology,
    TopologyBuilder,
};
pub use crate::agent_loop::{AgentRunner, Event, EventActions, EventStream, Runner};
pub use crate::config::AgentreeConfig;
pub use crate::driver::{call_agent, drain_final_response, run_conversation, FinalResponse};
pub use crate::error::{AgentreeError, ErrorCategory, Result};
pub use crate::provider::{GoogleProvider, ModelProvider, ModelRequest, ModelResponse};
pub use crate::tools::{AgentTool, FnTool, Tool, ToolArguments, ToolContext, ToolParameters};
pub use crate::types::{Content, GenerationSettings, Part, Role};
