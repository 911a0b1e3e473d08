//! Error types for agentree.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Primary error type for all agentree operations.
#[derive(Error, Debug)]
pub enum AgentreeError {
    /// Malformed agent topology: empty or duplicate name, unknown capability,
    /// or a delegation cycle.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session already exists: app={app}, user={user}, session={session}")]
    DuplicateSession {
        app: String,
        user: String,
        session: String,
    },

    #[error("Session not found: app={app}, user={user}, session={session}")]
    SessionNotFound {
        app: String,
        user: String,
        session: String,
    },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    /// Failure surfaced while consuming a runner's event stream.
    #[error("Event stream failed: {message}")]
    Drain {
        message: String,
        #[source]
        source: Option<Box<AgentreeError>>,
    },
}

impl AgentreeError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    pub fn drain(message: impl Into<String>) -> Self {
        Self::Drain {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an error raised by the runner so the driver can report it as a
    /// stream failure while keeping the original as its source.
    pub fn into_drain(self) -> Self {
        match self {
            Self::Drain { .. } => self,
            other => Self::Drain {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::Toml(_) => ErrorCategory::Configuration,
            Self::DuplicateSession { .. } | Self::SessionNotFound { .. } => ErrorCategory::Session,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::ToolExecution { .. } | Self::InvalidArgument(_) => ErrorCategory::ToolExecution,
            Self::Drain { .. } => ErrorCategory::Drain,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentreeError>;
