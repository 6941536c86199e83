use crate::session::{Session, SessionSummary};
use async_trait::async_trait;
use docent_core::{DocentError, DocentResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Longest accepted session id, in chars.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Shared, individually locked session. Hold the guard for the whole
/// read-modify-write so turns from concurrent requests never interleave.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Trait for session storage backends.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The session for `id`, created empty on first reference.
    async fn get_or_create(&self, id: &str) -> SessionHandle;
    /// The session for `id`, if it exists.
    async fn get(&self, id: &str) -> Option<SessionHandle>;
    /// Drop the session. Returns whether it existed.
    async fn reset(&self, id: &str) -> bool;
    /// Snapshots of every session.
    async fn list(&self) -> Vec<SessionSummary>;
}

/// Process-local session store. Sessions live until reset or shutdown.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session exists.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().get(id) {
            return handle.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                info!(session_id = %id, "Session created");
                Arc::new(Mutex::new(Session::new(id)))
            })
            .clone()
    }

    async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(id).cloned()
    }

    async fn reset(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session reset");
        }
        removed
    }

    async fn list(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self.sessions.read().values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        summaries
    }
}

/// Reject ids that are empty, longer than [`MAX_SESSION_ID_LEN`] chars, or
/// contain control characters.
pub fn validate_session_id(id: &str) -> DocentResult<()> {
    if id.trim().is_empty() {
        return Err(DocentError::InvalidInput("session_id must not be empty".to_string()));
    }
    if id.chars().count() > MAX_SESSION_ID_LEN {
        return Err(DocentError::InvalidInput(format!(
            "session_id must be at most {MAX_SESSION_ID_LEN} characters"
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(DocentError::InvalidInput(
            "session_id must not contain control characters".to_string(),
        ));
    }
    Ok(())
}
