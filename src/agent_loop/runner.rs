//! Runner interfaces: bind a root agent to a session store and turn one user
//! message into an ordered stream of events.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use crate::agent::session::{SessionKey, SessionService};
use crate::agent::Agent;
use crate::config::AgentreeConfig;
use crate::error::Result;
use crate::provider::ModelProvider;
use crate::types::{Content, Role};

use super::events::Event;
use super::invocation::run_agent;
use super::types::{InvocationContext, RunSettings};

/// Ordered, finite, lazily produced events for one query.
pub type EventStream<'a> = BoxStream<'a, Result<Event>>;

/// Box any event stream into an [`EventStream`].
pub fn boxed<'a, S>(stream: S) -> EventStream<'a>
where
    S: Stream<Item = Result<Event>> + Send + 'a,
{
    Box::pin(stream)
}

/// Something that accepts a user message and yields the resulting events.
pub trait Runner: Send + Sync {
    fn run_async<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
        new_message: Content,
    ) -> EventStream<'a>;
}

/// Default runner: one root agent, one session store, one model provider.
pub struct AgentRunner {
    app_name: String,
    agent: Arc<Agent>,
    sessions: Arc<dyn SessionService>,
    provider: Arc<dyn ModelProvider>,
    settings: RunSettings,
}

impl AgentRunner {
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<Agent>,
        sessions: Arc<dyn SessionService>,
        provider: Arc<dyn ModelProvider>,
        config: &AgentreeConfig,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
            provider,
            settings: RunSettings::from(config),
        }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Conversation contents the root agent sees, rebuilt from session history.
    ///
    /// Only the user's messages and the root agent's own events count;
    /// delegated agents keep their conversations private.
    ///
    /// A function-call turn whose responses never arrived (the run failed in
    /// between) is dropped, since the model rejects an unanswered call.
    fn history_from(&self, events: &[Event]) -> Vec<Content> {
        let contents: Vec<Content> = events
            .iter()
            .filter(|e| !e.partial && (e.is_from_user() || e.author == self.agent.name()))
            .filter_map(|e| e.content.clone())
            .filter(|c| !c.is_empty())
            .collect();

        let mut history = Vec::with_capacity(contents.len());
        let mut iter = contents.into_iter().peekable();
        while let Some(content) = iter.next() {
            let answered = iter.peek().is_some_and(|next| next.role == Role::Function);
            if !content.function_calls().is_empty() && !answered {
                debug!(calls = content.function_calls().len(), "dropping unanswered function call");
                continue;
            }
            history.push(content);
        }
        history
    }
}

impl Runner for AgentRunner {
    fn run_async<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
        new_message: Content,
    ) -> EventStream<'a> {
        boxed(try_stream! {
            let key = SessionKey::new(&self.app_name, user_id, session_id);
            let session = self
                .sessions
                .get_session(&key)
                .await?
                .ok_or_else(|| key.not_found())?;

            let ctx = InvocationContext::new(self.provider.clone(), self.settings.clone());
            info!(
                invocation_id = %ctx.invocation_id,
                agent = self.agent.name(),
                session = %key,
                prior_events = session.events.len(),
                "run started"
            );

            let user_event = Event::user(ctx.invocation_id, new_message);
            let mut history = self.history_from(&session.events);
            history.extend(user_event.content.clone());
            self.sessions.append_event(&key, user_event).await?;

            let mut events = run_agent(self.agent.clone(), history, ctx);
            while let Some(event) = events.next().await {
                let event = event?;
                if !event.partial {
                    self.sessions.append_event(&key, event.clone()).await?;
                }
                debug!(author = %event.author, final_response = event.is_final_response(), "event");
                yield event;
            }
        })
    }
}

impl std::fmt::Debug for AgentRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRunner")
            .field("app_name", &self.app_name)
            .field("agent", &self.agent.name())
            .field("provider", &self.provider.provider_name())
            .field("settings", &self.settings)
            .finish()
    }
}
