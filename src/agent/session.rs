//! Session storage keyed by (app, user, session).

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::agent_loop::Event;
use crate::error::{AgentreeError, Result};

/// Identity of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    pub(crate) fn not_found(&self) -> AgentreeError {
        AgentreeError::SessionNotFound {
            app: self.app_name.clone(),
            user: self.user_id.clone(),
            session: self.session_id.clone(),
        }
    }

    fn duplicate(&self) -> AgentreeError {
        AgentreeError::DuplicateSession {
            app: self.app_name.clone(),
            user: self.user_id.clone(),
            session: self.session_id.clone(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// A conversation: its key plus an append-only event history.
///
/// Values handed out by a [`SessionService`] are snapshots; appending goes
/// through the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub events: Vec<Event>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    fn new(key: SessionKey) -> Self {
        Self {
            key,
            events: Vec::new(),
            last_update_time: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.key.session_id
    }
}

/// Storage for sessions.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Allocate a session. A `None` id gets a generated one; an id already in
    /// use fails with [`AgentreeError::DuplicateSession`].
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<Session>;

    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>>;

    /// Keys of every session `user_id` has in `app_name`, sorted.
    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<SessionKey>>;

    /// Returns whether a session was removed.
    async fn delete_session(&self, key: &SessionKey) -> Result<bool>;

    /// Append one event. Partial events are not stored.
    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<()>;
}

/// Process-lifetime, in-memory session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<Session> {
        let session_id = match session_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            Some(_) => {
                return Err(AgentreeError::configuration("session id must not be blank"));
            }
            None => uuid::Uuid::new_v4().to_string(),
        };
        let key = SessionKey::new(app_name, user_id, session_id);

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&key) {
            return Err(key.duplicate());
        }
        let session = Session::new(key.clone());
        sessions.insert(key.clone(), session.clone());
        info!(session = %key, "session created");
        Ok(session)
    }

    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<SessionKey>> {
        let sessions = self.sessions.read().await;
        let mut keys: Vec<SessionKey> = sessions
            .keys()
            .filter(|k| k.app_name == app_name && k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<bool> {
        Ok(self.sessions.write().await.remove(key).is_some())
    }

    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<()> {
        if event.partial {
            return Ok(());
        }
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(key).ok_or_else(|| key.not_found())?;
        session.last_update_time = event.timestamp;
        session.events.push(event);
        Ok(())
    }
}
