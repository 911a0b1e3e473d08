//! The immutable agent definition.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::agent_loop::USER_AUTHOR;
use crate::error::{AgentreeError, Result};
use crate::provider::ToolDeclaration;
use crate::tools::Tool;

/// A named unit of delegated behaviour: an instruction, a model, and the
/// capabilities it may call. Immutable once built.
pub struct Agent {
    name: String,
    model: String,
    instruction: String,
    description: String,
    capabilities: Vec<Arc<dyn Tool>>,
}

fn identifier() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

/// Check that `name` can identify an agent or capability.
///
/// Names double as function names on the wire, so they must be identifiers,
/// and `user` is reserved for the human side of the conversation.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AgentreeError::configuration("agent name must not be empty"));
    }
    if !identifier().is_match(name) {
        return Err(AgentreeError::configuration(format!(
            "'{name}' is not a valid name; use letters, digits, and underscores"
        )));
    }
    if name == USER_AUTHOR {
        return Err(AgentreeError::configuration("'user' is a reserved name"));
    }
    Ok(())
}

impl Agent {
    /// Create an agent with no instruction, description, or capabilities.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let model = model.into();
        validate_name(&name)?;
        if model.trim().is_empty() {
            return Err(AgentreeError::configuration(format!(
                "agent '{name}' has no model"
            )));
        }
        Ok(Self {
            name,
            model,
            instruction: String::new(),
            description: String::new(),
            capabilities: Vec::new(),
        })
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a capability. Capability names must be unique within the agent.
    pub fn with_capability(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        if tool.name() == self.name {
            return Err(AgentreeError::configuration(format!(
                "agent '{}' cannot list itself as a capability",
                self.name
            )));
        }
        if self.capability(tool.name()).is_some() {
            return Err(AgentreeError::configuration(format!(
                "agent '{}' lists capability '{}' twice",
                self.name,
                tool.name()
            )));
        }
        self.capabilities.push(tool);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn capabilities(&self) -> &[Arc<dyn Tool>] {
        &self.capabilities
    }

    pub fn capability(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.capabilities.iter().find(|t| t.name() == name)
    }

    pub fn tool_declarations(&self) -> Vec<ToolDeclaration> {
        self.capabilities.iter().map(|t| t.declaration()).collect()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("description", &self.description)
            .field(
                "capabilities",
                &self.capabilities.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
