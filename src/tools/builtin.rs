//! Leaf tools executed by the model service.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolContext, ToolKind};
use crate::error::AgentreeError;
use crate::provider::google::GOOGLE_SEARCH;

/// Web search, grounded by the model service itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSearch;

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        GOOGLE_SEARCH
    }

    fn description(&self) -> &str {
        "Searches the web for up-to-date facts."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Builtin
    }

    async fn execute(
        &self,
        _args: &ToolArguments,
        _ctx: &ToolContext,
    ) -> Result<serde_json::Value, AgentreeError> {
        Err(AgentreeError::tool(
            GOOGLE_SEARCH,
            "built-in search runs inside the model service and cannot be called locally",
        ))
    }
}

/// The `google_search` leaf tool.
pub fn google_search() -> Arc<dyn Tool> {
    Arc::new(WebSearch)
}

/// Every built-in leaf tool, keyed by the name topologies refer to it by.
pub fn all_builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![google_search()]
}
