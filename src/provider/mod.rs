//! Model provider trait and the Gemini implementation.
//!
//! The provider is the injected policy that decides, turn by turn, whether an
//! agent answers directly or calls one of its capabilities.

pub mod google;
pub mod http;

pub use google::GoogleProvider;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Content, FinishReason, GenerationSettings, Usage};

/// A capability declared to the model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolDeclaration {
    /// Executed locally when the model calls it.
    Function {
        name: String,
        description: String,
        parameters: serde_json::Value,
    },
    /// Executed by the model service itself (e.g. grounding search).
    Builtin { name: String },
}

impl ToolDeclaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Function { name, .. } | Self::Builtin { name } => name,
        }
    }
}

/// A single model turn request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    pub tools: Vec<ToolDeclaration>,
    pub settings: GenerationSettings,
}

/// A single model turn response.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: Content,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
    /// Set when the service refused the prompt outright.
    pub block_reason: Option<String>,
}

impl ModelResponse {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            finish_reason: Some(FinishReason::Stop),
            usage: Usage::default(),
            block_reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            content: Content::new(crate::types::Role::Model, Vec::new()),
            finish_reason: Some(FinishReason::ContentFilter),
            usage: Usage::default(),
            block_reason: Some(reason.into()),
        }
    }
}

/// Core trait implemented by model backends.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g. "google").
    fn provider_name(&self) -> &str;

    /// Run one model turn.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse>;
}
