//! Login session model.
//!
//! ## Lifecycle
//!
//! ```text
//! Anonymous --(credentials accepted)--> Authenticated
//! Authenticated --(logout | idle timeout | unroutable level)--> Anonymous
//! ```
//!
//! The `Authenticating` step lives only for the duration of a credential
//! check; it is never persisted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No user is logged in.
    Anonymous,
    /// Credentials are being checked for this session.
    Authenticating,
    /// A user is logged in.
    Authenticated,
}

/// The logged-in user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User identifier in the user store.
    pub user_id: Uuid,
    /// Login name (IDN-normalized).
    pub user_name: String,
    /// User level as stored, e.g. `admin`, `reseller` or `user`.
    ///
    /// Kept as text: the session record may outlive the set of levels the
    /// running build knows how to route.
    pub level: String,
    /// When the user logged in.
    pub logged_in_at: DateTime<Utc>,
}

impl Identity {
    /// Creates an identity for a user logging in now.
    #[must_use]
    pub fn new(user_id: Uuid, user_name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            level: level.into(),
            logged_in_at: Utc::now(),
        }
    }
}

/// A visitor session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier, also the cookie value.
    pub id: Uuid,
    /// Logged-in user, if any.
    pub identity: Option<Identity>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Creates a new anonymous session.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Returns the current authentication state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.identity.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Checks if a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Attaches a logged-in user.
    pub fn login(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.touch();
    }

    /// Clears the authentication state, returning the identity that was
    /// logged in.
    pub fn logout(&mut self) -> Option<Identity> {
        self.identity.take()
    }

    /// Updates the last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Returns the idle time at `now`.
    #[must_use]
    pub fn idle_time(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity
    }

    /// Checks if the session has been idle longer than `timeout` at `now`.
    #[must_use]
    pub fn is_idle(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        self.idle_time(now) > timeout
    }

    /// Clears the identity when the session has been idle longer than
    /// `timeout`. Returns the identity that timed out, if any.
    pub fn expire_if_idle(&mut self, timeout: Duration, now: DateTime<Utc>) -> Option<Identity> {
        if self.is_idle(timeout, now) {
            self.logout()
        } else {
            None
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new(Uuid::now_v7(), "admin", "admin")
    }

    #[test]
    fn new_session_is_anonymous() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[test]
    fn login_and_logout() {
        let mut session = Session::new();
        session.login(identity());
        assert_eq!(session.state(), SessionState::Authenticated);

        let previous = session.logout().unwrap();
        assert_eq!(previous.user_name, "admin");
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.logout().is_none());
    }

    #[test]
    fn idle_session_expires() {
        let mut session = Session::new();
        session.login(identity());
        session.last_activity = Utc::now() - Duration::minutes(31);

        let expired = session.expire_if_idle(Duration::minutes(30), Utc::now());
        assert!(expired.is_some());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn active_session_is_kept() {
        let mut session = Session::new();
        session.login(identity());
        session.last_activity = Utc::now() - Duration::minutes(5);

        assert!(session.expire_if_idle(Duration::minutes(30), Utc::now()).is_none());
        assert!(session.is_authenticated());
    }
}
