//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::str::FromStr;

use hcp_core::{BruteForceConfig, DatabaseUpdate, MaintenanceConfig, PanelConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Whether the listener itself is reached over TLS.
    pub tls: bool,

    /// Whether `X-Forwarded-For` / `X-Forwarded-Proto` are trusted.
    pub trust_proxy: bool,

    /// Applied database revision.
    pub db_revision: u32,

    /// Database revision shipped with this build.
    pub db_revision_latest: u32,

    /// Administrator seeded into the user store at startup, if any.
    pub admin_user: Option<String>,

    /// Password of the seeded administrator.
    pub admin_password: Option<String>,

    /// Settings handed to the login gate.
    pub panel: PanelConfig,

    /// Log level.
    pub log_level: String,
}

/// Reads and parses an environment variable, if set and well-formed.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Reads a boolean flag; `0`, `false`, `no` and `off` are false.
fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off" | ""))
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let host = std::env::var("HCP_HOST").unwrap_or(defaults.host);
        let port = env_parse("HCP_PORT").unwrap_or(defaults.port);
        let tls = env_flag("HCP_TLS").unwrap_or(defaults.tls);
        let trust_proxy = env_flag("HCP_TRUST_PROXY").unwrap_or(defaults.trust_proxy);

        let db_revision = env_parse("HCP_DB_REVISION").unwrap_or(0);
        let db_revision_latest = env_parse("HCP_DB_REVISION_LATEST").unwrap_or(db_revision);

        let admin_user = std::env::var("HCP_ADMIN_USER").ok().filter(|v| !v.is_empty());
        let admin_password = std::env::var("HCP_ADMIN_PASSWORD").ok();

        let panel = Self::panel_from_env(defaults.panel);

        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);

        let config = Self {
            host,
            port,
            tls,
            trust_proxy,
            db_revision,
            db_revision_latest,
            admin_user,
            admin_password,
            panel,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings before the server starts.
    ///
    /// # Errors
    ///
    /// Fails when the seeded administrator has no password or a panel
    /// duration is negative or out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admin_user.is_some() && self.admin_password.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("HCP_ADMIN_PASSWORD is required when HCP_ADMIN_USER is set");
        }
        if let Err(e) = self.panel.validate() {
            anyhow::bail!("invalid panel settings: {e}");
        }
        Ok(())
    }

    fn panel_from_env(defaults: PanelConfig) -> PanelConfig {
        let bf = defaults.brute_force;
        let brute_force = BruteForceConfig {
            enabled: env_flag("HCP_BRUTEFORCE").unwrap_or(bf.enabled),
            max_attempts: env_parse("HCP_BRUTEFORCE_MAX_ATTEMPTS").unwrap_or(bf.max_attempts),
            block_minutes: env_parse("HCP_BRUTEFORCE_BLOCK_MINUTES").unwrap_or(bf.block_minutes),
            wait_between: env_flag("HCP_BRUTEFORCE_WAIT_BETWEEN").unwrap_or(bf.wait_between),
            wait_between_secs: env_parse("HCP_BRUTEFORCE_WAIT_SECS")
                .unwrap_or(bf.wait_between_secs),
            tarpit_step_ms: env_parse("HCP_BRUTEFORCE_TARPIT_STEP_MS")
                .unwrap_or(bf.tarpit_step_ms),
            tarpit_max_ms: env_parse("HCP_BRUTEFORCE_TARPIT_MAX_MS").unwrap_or(bf.tarpit_max_ms),
        };

        PanelConfig {
            session_timeout_minutes: env_parse("HCP_SESSION_TIMEOUT")
                .unwrap_or(defaults.session_timeout_minutes),
            maintenance: MaintenanceConfig {
                enabled: env_flag("HCP_MAINTENANCE").unwrap_or(defaults.maintenance.enabled),
                message: std::env::var("HCP_MAINTENANCE_MESSAGE")
                    .unwrap_or(defaults.maintenance.message),
            },
            ssl_enabled: env_flag("HCP_SSL_ENABLED").unwrap_or(defaults.ssl_enabled),
            lost_password: env_flag("HCP_LOST_PASSWORD").unwrap_or(defaults.lost_password),
            brute_force,
            ..defaults
        }
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            tls: false,
            trust_proxy: true,
            db_revision: 0,
            db_revision_latest: 0,
            admin_user: None,
            admin_password: None,
            panel: PanelConfig::for_testing(),
            log_level: "debug".to_string(),
        }
    }

    /// Returns the database revision probe.
    #[must_use]
    pub const fn database_update(&self) -> DatabaseUpdate {
        DatabaseUpdate::new(self.db_revision, self.db_revision_latest)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tls: false,
            trust_proxy: false,
            db_revision: 0,
            db_revision_latest: 0,
            admin_user: None,
            admin_password: None,
            panel: PanelConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use hcp_core::UpdateProbe;

    use super::*;

    #[test]
    fn defaults_bind_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(!config.trust_proxy);
        assert!(!config.database_update().is_update_available());
    }

    #[test]
    fn lagging_revision_means_pending_update() {
        let config = ServerConfig {
            db_revision: 3,
            db_revision_latest: 4,
            ..ServerConfig::for_testing()
        };
        assert!(config.database_update().is_update_available());
    }

    #[test]
    fn admin_without_password_is_rejected() {
        let config = ServerConfig {
            admin_user: Some("admin".to_string()),
            admin_password: Some(String::new()),
            ..ServerConfig::for_testing()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("HCP_ADMIN_PASSWORD"));
    }

    #[test]
    fn out_of_range_timeout_is_rejected() {
        let mut config = ServerConfig::for_testing();
        assert!(config.validate().is_ok());

        config.panel.session_timeout_minutes = 153_722_867_280_912_931;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session timeout"));

        config.panel.session_timeout_minutes = 30;
        config.panel.brute_force.wait_between_secs = -1;
        assert!(config.validate().is_err());
    }
}
