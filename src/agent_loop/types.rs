//! Core invocation types for the agent loop.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::AgentreeConfig;
use crate::error::{AgentreeError, Result};
use crate::provider::ModelProvider;
use crate::types::GenerationSettings;

/// Unique identifier of one query's processing.
pub type InvocationId = Uuid;

/// Limits applied to every agent invocation in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub max_turns: usize,
    pub max_delegation_depth: usize,
    pub generation: GenerationSettings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from(&AgentreeConfig::default())
    }
}

impl From<&AgentreeConfig> for RunSettings {
    fn from(config: &AgentreeConfig) -> Self {
        Self {
            max_turns: config.max_turns.max(1),
            max_delegation_depth: config.max_delegation_depth,
            generation: config.generation.clone(),
        }
    }
}

/// State threaded through an invocation and every delegation below it.
#[derive(Clone)]
pub struct InvocationContext {
    pub invocation_id: InvocationId,
    pub provider: Arc<dyn ModelProvider>,
    pub settings: RunSettings,
    /// 0 for the root agent, +1 per delegation hop.
    pub depth: usize,
}

impl InvocationContext {
    pub fn new(provider: Arc<dyn ModelProvider>, settings: RunSettings) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            provider,
            settings,
            depth: 0,
        }
    }

    /// Context for running `agent` one level below this one.
    pub fn delegate(&self, agent: &str) -> Result<Self> {
        let depth = self.depth + 1;
        if depth > self.settings.max_delegation_depth {
            return Err(AgentreeError::tool(
                agent,
                format!(
                    "delegation depth {depth} exceeds limit of {}",
                    self.settings.max_delegation_depth
                ),
            ));
        }
        Ok(Self {
            depth,
            ..self.clone()
        })
    }
}
