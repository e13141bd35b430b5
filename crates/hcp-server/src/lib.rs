//! # hcp-server
//!
//! Axum server for the hosting control panel login gate.
//!
//! This crate provides:
//! - the [`LoginGate`] deciding between login form, maintenance notice and
//!   redirect to the user's landing page
//! - askama templates for the login and maintenance pages
//! - `GET /` and `POST /` handlers with a cookie-backed session
//! - health check endpoints
//!
//! ## Usage
//!
//! ```ignore
//! use hcp_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod gate;
pub mod hooks;
pub mod message;
pub mod router;
pub mod state;
pub mod ui;
pub mod view;

pub use config::ServerConfig;
pub use gate::{GateOutcome, GateRequest, LoginForm, LoginGate};
pub use hooks::LoginHook;
pub use router::create_router;
pub use state::AppState;
pub use view::{AskamaRenderer, RenderError, Renderer, View};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hcp_auth::{
    CredentialAuthenticator, LoginThrottle, MemoryUserStore, PasswordService, UserLevel,
};
use hcp_session::{MemorySessionStore, SessionStore};
use tokio::net::TcpListener;

/// How often idle sessions are swept from the store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// The login gate server.
pub struct Server {
    config: ServerConfig,
    sessions: Arc<MemorySessionStore>,
    gate: Arc<LoginGate>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// Validates the configuration and seeds the configured administrator
    /// into the user store.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let passwords = PasswordService::default();
        let users = Arc::new(MemoryUserStore::new(passwords.clone()));

        if let (Some(name), Some(password)) = (&config.admin_user, &config.admin_password) {
            let name = hcp_auth::input::normalize_username(name)?;
            users.add_user(&name, password, UserLevel::Admin)?;
            tracing::info!(user = %name, "administrator account seeded");
        }

        let throttle = Arc::new(LoginThrottle::new(config.panel.brute_force.clone()));
        let authenticator = Arc::new(CredentialAuthenticator::new(
            users,
            passwords,
            throttle.clone(),
        ));
        let gate = LoginGate::builder(config.panel.clone(), authenticator, throttle)
            .updates(Arc::new(config.database_update()))
            .build();

        Ok(Self {
            config,
            sessions: Arc::new(MemorySessionStore::new()),
            gate: Arc::new(gate),
        })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let sweeper = tokio::spawn(sweep_idle_sessions(
            self.sessions.clone(),
            self.config.panel.session_timeout(),
        ));

        let app = self.test_router();

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on http://{}", addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        sweeper.abort();
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Creates a router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> Router {
        let state = AppState::new(self.config.clone(), self.gate.clone(), self.sessions.clone());
        create_router(state)
    }
}

/// Periodically removes sessions idle for longer than `timeout`.
async fn sweep_idle_sessions(sessions: Arc<MemorySessionStore>, timeout: chrono::Duration) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = sessions.remove_idle(timeout).await {
            tracing::warn!("session sweep failed: {e}");
        }
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
