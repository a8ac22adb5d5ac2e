//! Session storage and per-session serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use crate::models::ConversationSession;

/// Session store errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Session store lock poisoned")]
    LockPoisoned,

    #[error("Session store failure: {0}")]
    Storage(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Keyed storage for conversation sessions.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &str) -> SessionResult<Option<ConversationSession>>;

    fn put(&self, session: ConversationSession) -> SessionResult<()>;

    /// Remove a session. Returns whether it existed.
    fn delete(&self, id: &str) -> SessionResult<bool>;
}

/// Process-local session table.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &str) -> SessionResult<Option<ConversationSession>> {
        let sessions = self.sessions.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions.get(id).cloned())
    }

    fn put(&self, session: ConversationSession) -> SessionResult<()> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn delete(&self, id: &str) -> SessionResult<bool> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions.remove(id).is_some())
    }
}

/// One mutex per active session id.
///
/// The map lock is held only to look up or prune handles, never while a
/// message is processed, so sessions do not block each other.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock handle for `id`, created on first use.
    pub fn handle(&self, id: &str) -> SessionResult<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(locks.entry(id.to_string()).or_default().clone())
    }

    /// Drop handles nobody holds.
    pub fn prune(&self) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.retain(|_, handle| Arc::strong_count(handle) > 1);
        }
    }

    pub fn active(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}
