//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use std::sync::Arc;

use hcp_session::SessionStore;

use crate::config::ServerConfig;
use crate::gate::LoginGate;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,

    /// The login gate.
    pub gate: Arc<LoginGate>,

    /// Session persistence.
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: ServerConfig, gate: Arc<LoginGate>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            gate,
            sessions,
        }
    }

    /// Returns the server configuration.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }
}
