//! Capabilities agents can invoke.

pub mod agent_tool;
pub mod arguments;
pub mod builtin;
pub mod tool;
pub mod types;

pub use agent_tool::AgentTool;
pub use arguments::ToolArguments;
pub use builtin::{google_search, WebSearch};
pub use tool::{FnTool, Tool, ToolContext, ToolKind};
pub use types::ToolParameters;
