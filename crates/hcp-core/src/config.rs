//! Panel configuration.
//!
//! The login gate receives a [`PanelConfig`] at construction time and only
//! ever reads it. Loading from the environment happens in the server crate.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest accepted session timeout or block time, in minutes (one year).
pub const MAX_MINUTES: i64 = 366 * 24 * 60;

/// Longest accepted wait between attempts, in seconds (one day).
pub const MAX_WAIT_SECS: i64 = 24 * 60 * 60;

/// Longest accepted tarpit delay, in milliseconds.
pub const MAX_TARPIT_MS: u64 = 60_000;

/// Read-only panel settings consumed by the login gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Idle session timeout in minutes.
    pub session_timeout_minutes: i64,
    /// Maintenance mode settings.
    pub maintenance: MaintenanceConfig,
    /// Whether the panel offers an SSL/non-SSL switch link.
    pub ssl_enabled: bool,
    /// Whether the lost password feature is offered.
    pub lost_password: bool,
    /// Brute force protection settings.
    pub brute_force: BruteForceConfig,
    /// Product branding shown in the page layout.
    pub branding: ProductBranding,
    /// Landing page per user level.
    pub landing: LandingPages,
}

/// Maintenance mode settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Whether maintenance mode is on.
    pub enabled: bool,
    /// Message shown to visitors while maintenance mode is on.
    pub message: String,
}

/// Brute force protection settings.
///
/// Failed attempts are counted per client address. Reaching
/// `max_attempts` blocks the address for `block_minutes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BruteForceConfig {
    /// Whether failed attempts are tracked at all.
    pub enabled: bool,
    /// Failed attempts allowed before the address is blocked.
    pub max_attempts: u32,
    /// Block duration in minutes.
    pub block_minutes: i64,
    /// Whether a minimum delay between attempts is enforced.
    pub wait_between: bool,
    /// Minimum delay between attempts in seconds.
    pub wait_between_secs: i64,
    /// Response delay added per recent failure, in milliseconds.
    pub tarpit_step_ms: u64,
    /// Upper bound of the response delay, in milliseconds.
    pub tarpit_max_ms: u64,
}

/// Product branding shown in every page layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductBranding {
    /// Long product name.
    pub long_name: String,
    /// Product homepage.
    pub link: String,
    /// Copyright line.
    pub copyright: String,
    /// Document character set.
    pub charset: String,
}

/// Landing page per user level.
///
/// An empty path means the level has no landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingPages {
    /// Administrator landing page.
    pub admin: String,
    /// Reseller landing page.
    pub reseller: String,
    /// Client landing page.
    pub client: String,
}

impl PanelConfig {
    /// Returns the idle session timeout.
    ///
    /// Out-of-range values are clamped; [`PanelConfig::validate`] reports them.
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        minutes(self.session_timeout_minutes.max(1))
    }

    /// Checks that every duration is positive where required and in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_MINUTES).contains(&self.session_timeout_minutes) {
            return Err(Error::Config(format!(
                "session timeout must be between 1 and {MAX_MINUTES} minutes, got {}",
                self.session_timeout_minutes
            )));
        }
        self.brute_force.validate()
    }

    /// Creates a configuration for testing: short timeouts, no tarpit.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            session_timeout_minutes: 30,
            brute_force: BruteForceConfig {
                tarpit_step_ms: 0,
                tarpit_max_ms: 0,
                ..BruteForceConfig::default()
            },
            ..Self::default()
        }
    }
}

impl BruteForceConfig {
    /// Returns the block duration.
    #[must_use]
    pub fn block_time(&self) -> Duration {
        minutes(self.block_minutes)
    }

    /// Returns the minimum delay between attempts.
    #[must_use]
    pub fn wait_between_time(&self) -> Duration {
        Duration::try_seconds(self.wait_between_secs.clamp(0, MAX_WAIT_SECS))
            .unwrap_or_else(Duration::zero)
    }

    /// Checks the brute force durations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for negative or oversized values.
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_MINUTES).contains(&self.block_minutes) {
            return Err(Error::Config(format!(
                "block time must be between 0 and {MAX_MINUTES} minutes, got {}",
                self.block_minutes
            )));
        }
        if !(0..=MAX_WAIT_SECS).contains(&self.wait_between_secs) {
            return Err(Error::Config(format!(
                "wait between attempts must be between 0 and {MAX_WAIT_SECS} seconds, got {}",
                self.wait_between_secs
            )));
        }
        if self.tarpit_max_ms > MAX_TARPIT_MS {
            return Err(Error::Config(format!(
                "tarpit delay must not exceed {MAX_TARPIT_MS} ms, got {}",
                self.tarpit_max_ms
            )));
        }
        Ok(())
    }
}

/// Minutes as a duration, clamped to `0..=MAX_MINUTES`.
fn minutes(value: i64) -> Duration {
    Duration::try_minutes(value.clamp(0, MAX_MINUTES)).unwrap_or_else(Duration::zero)
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            session_timeout_minutes: 30,
            maintenance: MaintenanceConfig::default(),
            ssl_enabled: false,
            lost_password: false,
            brute_force: BruteForceConfig::default(),
            branding: ProductBranding::default(),
            landing: LandingPages::default(),
        }
    }
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            block_minutes: 30,
            wait_between: true,
            wait_between_secs: 30,
            tarpit_step_ms: 500,
            tarpit_max_ms: 5_000,
        }
    }
}

impl Default for ProductBranding {
    fn default() -> Self {
        Self {
            long_name: "internet Multi Server Control Panel".to_string(),
            link: "http://www.i-mscp.net".to_string(),
            copyright: "© 2010-2011 i-MSCP Team - All Rights Reserved".to_string(),
            charset: "UTF-8".to_string(),
        }
    }
}

impl Default for LandingPages {
    fn default() -> Self {
        Self {
            admin: "/admin/index.php".to_string(),
            reseller: "/reseller/index.php".to_string(),
            client: "/client/index.php".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let config = PanelConfig::default();
        assert_eq!(config.session_timeout(), Duration::minutes(30));
        assert_eq!(config.brute_force.block_time(), Duration::minutes(30));
        assert_eq!(config.brute_force.wait_between_time(), Duration::seconds(30));
    }

    #[test]
    fn testing_config_disables_tarpit() {
        let config = PanelConfig::for_testing();
        assert_eq!(config.brute_force.tarpit_max_ms, 0);
        assert!(!config.maintenance.enabled);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: PanelConfig =
            serde_json::from_str(r#"{"maintenance":{"enabled":true}}"#).unwrap();
        assert!(config.maintenance.enabled);
        assert!(config.maintenance.message.is_empty());
        assert_eq!(config.brute_force.max_attempts, 3);
        assert_eq!(config.landing.admin, "/admin/index.php");
    }

    #[test]
    fn defaults_are_valid() {
        assert!(PanelConfig::default().validate().is_ok());
        assert!(PanelConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn huge_timeout_is_rejected_and_clamped() {
        let config = PanelConfig {
            session_timeout_minutes: i64::MAX / 2,
            ..PanelConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("session timeout"));
        assert_eq!(config.session_timeout(), Duration::minutes(MAX_MINUTES));
    }

    #[test]
    fn negative_durations_are_rejected() {
        let config = PanelConfig {
            session_timeout_minutes: -5,
            ..PanelConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.session_timeout(), Duration::minutes(1));

        let brute_force = BruteForceConfig {
            block_minutes: -1,
            ..BruteForceConfig::default()
        };
        assert!(brute_force.validate().unwrap_err().to_string().contains("block time"));
        assert_eq!(brute_force.block_time(), Duration::zero());

        let brute_force = BruteForceConfig {
            wait_between_secs: i64::MIN,
            ..BruteForceConfig::default()
        };
        assert!(brute_force.validate().is_err());
        assert_eq!(brute_force.wait_between_time(), Duration::zero());
    }

    #[test]
    fn oversized_tarpit_is_rejected() {
        let brute_force = BruteForceConfig {
            tarpit_max_ms: u64::MAX,
            ..BruteForceConfig::default()
        };
        assert!(brute_force.validate().is_err());
    }
}
