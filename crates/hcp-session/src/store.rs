//! Session storage.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::SessionResult;
use crate::session::Session;

/// Persistence for visitor sessions.
///
/// Each request loads its session once and saves it once. Concurrent
/// requests of the same visitor are last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Gets a session by ID.
    async fn load(&self, id: Uuid) -> SessionResult<Option<Session>>;

    /// Creates or replaces a session.
    async fn save(&self, session: &Session) -> SessionResult<()>;

    /// Removes a session.
    async fn remove(&self, id: Uuid) -> SessionResult<()>;

    /// Removes sessions idle for longer than `timeout`.
    ///
    /// Returns the number of sessions removed.
    async fn remove_idle(&self, timeout: Duration) -> SessionResult<u64>;
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Checks if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> SessionResult<Option<Session>> {
        Ok(self.sessions.get(&id).map(|s| s.value().clone()))
    }

    async fn save(&self, session: &Session) -> SessionResult<()> {
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> SessionResult<()> {
        self.sessions.remove(&id);
        Ok(())
    }

    async fn remove_idle(&self, timeout: Duration) -> SessionResult<u64> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_idle(timeout, now));
        let removed = before.saturating_sub(self.sessions.len()) as u64;
        if removed > 0 {
            tracing::debug!(removed, "removed idle sessions");
        }
        Ok(removed)
    }
}
