//! Events emitted while a query is processed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Content, Role};

use super::types::InvocationId;

/// Author recorded on events that carry the user's message.
pub const USER_AUTHOR: &str = "user";

/// Side effects an event requests from whoever consumes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventActions {
    /// The agent chain gave up; not an error, but no normal answer follows.
    pub escalate: bool,
    /// Treat this event as the final answer even if it carries tool traffic.
    pub skip_summarization: bool,
}

/// One step of processing: a user message, a model turn, tool traffic, or an
/// escalation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub invocation_id: InvocationId,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Streaming fragment; never persisted and never final.
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub actions: EventActions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(invocation_id: InvocationId, author: impl Into<String>, content: Option<Content>) -> Self {
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            author: author.into(),
            content,
            partial: false,
            actions: EventActions::default(),
            error_code: None,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(invocation_id: InvocationId, content: Content) -> Self {
        Self::new(invocation_id, USER_AUTHOR, Some(content))
    }

    /// A terminal event signalling that `author` could not produce an answer.
    pub fn escalation(
        invocation_id: InvocationId,
        author: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            actions: EventActions {
                escalate: true,
                ..EventActions::default()
            },
            error_message: message,
            ..Self::new(invocation_id, author, None)
        }
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn is_escalation(&self) -> bool {
        self.actions.escalate
    }

    /// Whether this event ends a query's stream from the consumer's point of view.
    pub fn is_final_response(&self) -> bool {
        if self.actions.skip_summarization {
            return true;
        }
        if self.partial {
            return false;
        }
        match &self.content {
            Some(content) => {
                content.function_calls().is_empty() && content.function_responses().is_empty()
            }
            None => true,
        }
    }

    /// First text part of the content, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Content::first_text)
    }

    pub fn is_from_user(&self) -> bool {
        self.author == USER_AUTHOR
            && self.content.as_ref().is_some_and(|c| c.role == Role::User)
    }
}
