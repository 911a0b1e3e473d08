//! Shared test helpers: a scripted model provider and a scripted runner.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{stream, StreamExt};

use agentree::agent_loop::{boxed, Event, EventStream, Runner};
use agentree::error::{AgentreeError, Result};
use agentree::provider::{ModelProvider, ModelRequest, ModelResponse};
use agentree::types::{Content, FunctionCall, Part, Role};

/// A provider that replays queued turns in order and records every request.
///
/// All agents in a tree share one provider, and delegation is sequential, so a
/// single queue describes the whole conversation.
#[derive(Default)]
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Result<ModelResponse>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a plain text answer.
    pub fn queue_text(&self, text: &str) -> &Self {
        self.queue(Ok(ModelResponse::new(Content::model_text(text))))
    }

    /// Queue a single function call.
    pub fn queue_call(&self, name: &str, args: serde_json::Value) -> &Self {
        self.queue(Ok(call_response(vec![(name, args)])))
    }

    /// Queue a refusal.
    pub fn queue_blocked(&self, reason: &str) -> &Self {
        self.queue(Ok(ModelResponse::blocked(reason)))
    }

    pub fn queue_error(&self, err: AgentreeError) -> &Self {
        self.queue(Err(err))
    }

    pub fn queue(&self, turn: Result<ModelResponse>) -> &Self {
        self.turns.lock().unwrap().push_back(turn);
        self
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.turns.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ModelResponse::new(Content::model_text("Mock response"))))
    }
}

/// A model turn that calls each `(name, args)` in order.
pub fn call_response(calls: Vec<(&str, serde_json::Value)>) -> ModelResponse {
    let parts = calls
        .into_iter()
        .enumerate()
        .map(|(i, (name, args))| {
            Part::FunctionCall(FunctionCall {
                id: format!("call_{i}_{name}"),
                name: name.to_string(),
                args,
            })
        })
        .collect();
    ModelResponse::new(Content::new(Role::Model, parts))
}

/// A runner that replays a fixed list of events and counts how many were pulled.
pub struct ScriptedRunner {
    script: Mutex<Option<Vec<Result<Event>>>>,
    pulled: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    pub fn new(events: Vec<Result<Event>>) -> Self {
        Self {
            script: Mutex::new(Some(events)),
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

impl Runner for ScriptedRunner {
    fn run_async<'a>(
        &'a self,
        _user_id: &'a str,
        _session_id: &'a str,
        _new_message: Content,
    ) -> EventStream<'a> {
        let events = self.script.lock().unwrap().take().unwrap_or_default();
        let pulled = Arc::clone(&self.pulled);
        boxed(stream::iter(events).inspect(move |_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

pub fn model_event(author: &str, text: &str) -> Event {
    Event::new(uuid::Uuid::nil(), author, Some(Content::model_text(text)))
}

pub fn call_event(author: &str, name: &str) -> Event {
    let response = call_response(vec![(name, serde_json::json!({ "request": "x" }))]);
    Event::new(uuid::Uuid::nil(), author, Some(response.content))
}
