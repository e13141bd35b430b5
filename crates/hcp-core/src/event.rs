//! Audit events for the login flow.
//!
//! Every security-relevant decision of the login gate produces an [`Event`].
//! Events are serialized to JSON and written to the `audit` tracing target,
//! so a subscriber can route them to a dedicated sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// User logged in.
    Login,
    /// Login attempt failed.
    LoginError,
    /// User logged out explicitly.
    Logout,
    /// Session expired through inactivity.
    SessionTimeout,
    /// Authenticated session was cleared because it could not be routed
    /// or its account is gone.
    ForcedLogout,
    /// Client address was blocked after repeated failures.
    AddressBlocked,
    /// Submitted data was rejected by the input safety rules.
    InvalidInput,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: EventType,
    /// Outcome of the event.
    pub outcome: EventOutcome,
    /// User name associated with the event.
    pub user_name: Option<String>,
    /// Source IP address.
    pub ip_address: Option<String>,
    /// Session ID.
    pub session_id: Option<String>,
    /// Error message (for failure events).
    pub error: Option<String>,
    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Writes the event to the `audit` tracing target.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => tracing::info!(target: "audit", event = %json),
            Err(e) => tracing::error!(target: "audit", "failed to serialize audit event: {e}"),
        }
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    user_name: Option<String>,
    ip_address: Option<String>,
    session_id: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            user_name: None,
            ip_address: None,
            session_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the user name.
    #[must_use]
    pub fn user(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Sets the IP address.
    #[must_use]
    pub fn ip_address(mut self, ip: impl ToString) -> Self {
        self.ip_address = Some(ip.to_string());
        self
    }

    /// Sets the session ID.
    #[must_use]
    pub fn session(mut self, session_id: impl ToString) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            user_name: self.user_name,
            ip_address: self.ip_address,
            session_id: self.session_id,
            error: self.error,
            details: self.details,
        }
    }

    /// Builds the event and writes it to the audit target.
    pub fn emit(self) {
        self.build().emit();
    }
}
