//! Error classification.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad error category, used to route retry and exit-code decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Session,
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Serialization,
    ToolExecution,
    Drain,
    Unknown,
}

impl ErrorCategory {
    /// Whether this category is raised while wiring agents and sessions,
    /// before any query reaches the runner.
    pub fn is_setup(self) -> bool {
        matches!(self, Self::Configuration | Self::Session)
    }
}
