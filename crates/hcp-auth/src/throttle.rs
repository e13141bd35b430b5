//! Brute force protection.
//!
//! Failed login attempts are counted per client address:
//!
//! - after `max_attempts` failures the address is blocked for the block time;
//! - with `wait_between` on, a new attempt is refused until the wait window
//!   after the last failure has passed;
//! - the gate delays its response by a tarpit proportional to the number of
//!   recent failures.
//!
//! Records older than the block time are dropped by [`LoginThrottle::init`].

use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hcp_core::BruteForceConfig;

use crate::error::{AuthError, AuthResult};

/// Failed attempts of one client address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Failures since the record was created.
    pub failures: u32,
    /// Time of the last failure, if any.
    pub last_failure: Option<DateTime<Utc>>,
    /// End of the current block, if blocked.
    pub blocked_until: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            failures: 0,
            last_failure: None,
            blocked_until: None,
            created_at: now,
        }
    }

    fn is_stale(&self, block_time: Duration, now: DateTime<Utc>) -> bool {
        match self.blocked_until {
            Some(until) => until <= now,
            None => self.last_failure.unwrap_or(self.created_at) + block_time <= now,
        }
    }
}

/// Per-address login throttle.
#[derive(Debug)]
pub struct LoginThrottle {
    config: BruteForceConfig,
    records: DashMap<IpAddr, AttemptRecord>,
}

impl LoginThrottle {
    /// Creates a throttle with the given settings.
    #[must_use]
    pub fn new(config: BruteForceConfig) -> Self {
        Self {
            config,
            records: DashMap::new(),
        }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn config(&self) -> &BruteForceConfig {
        &self.config
    }

    /// Prepares bookkeeping for a request from `client`.
    ///
    /// Drops stale records of all addresses (expired blocks, failures older
    /// than the block time) and creates an empty record for `client` if it
    /// has none.
    pub fn init(&self, client: IpAddr, now: DateTime<Utc>) {
        let block_time = self.config.block_time();
        self.records.retain(|_, r| !r.is_stale(block_time, now));
        if self.config.enabled {
            self.records
                .entry(client)
                .or_insert_with(|| AttemptRecord::new(now));
        }
    }

    /// Checks whether `client` may attempt a login now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Blocked`] while the address is blocked and
    /// [`AuthError::MustWait`] inside the wait window.
    pub fn check(&self, client: IpAddr, now: DateTime<Utc>) -> AuthResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        if let Some(until) = self.blocked_until(client, now) {
            return Err(AuthError::Blocked { until });
        }
        if let Some(wait) = self.wait_remaining(client, now) {
            return Err(AuthError::MustWait {
                seconds: wait.num_seconds().max(1),
            });
        }
        Ok(())
    }

    /// Returns the end of the block on `client`, if one is in force.
    #[must_use]
    pub fn blocked_until(&self, client: IpAddr, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.records
            .get(&client)
            .and_then(|r| r.blocked_until)
            .filter(|until| *until > now)
    }

    /// Returns how long `client` still has to wait before the next attempt.
    #[must_use]
    pub fn wait_remaining(&self, client: IpAddr, now: DateTime<Utc>) -> Option<Duration> {
        if !self.config.enabled || !self.config.wait_between {
            return None;
        }
        let last = self.records.get(&client)?.last_failure?;
        let remaining = last + self.config.wait_between_time() - now;
        (remaining > Duration::zero()).then_some(remaining)
    }

    /// Records a failed attempt. Returns the failure count; the address is
    /// blocked once the count reaches `max_attempts`.
    pub fn record_failure(&self, client: IpAddr, now: DateTime<Utc>) -> u32 {
        if !self.config.enabled {
            return 0;
        }
        let mut record = self
            .records
            .entry(client)
            .or_insert_with(|| AttemptRecord::new(now));
        record.failures += 1;
        record.last_failure = Some(now);
        if record.failures >= self.config.max_attempts
            && record.blocked_until.map_or(true, |until| until <= now)
        {
            let until = now + self.config.block_time();
            record.blocked_until = Some(until);
            tracing::warn!(%client, failures = record.failures, %until, "client address blocked");
        }
        record.failures
    }

    /// Clears the record of `client` after a successful login.
    pub fn clear(&self, client: IpAddr) {
        self.records.remove(&client);
    }

    /// Returns the recorded failures of `client`.
    #[must_use]
    pub fn failures(&self, client: IpAddr) -> u32 {
        self.records.get(&client).map_or(0, |r| r.failures)
    }

    /// Returns the response delay for `client`.
    #[must_use]
    pub fn tarpit(&self, client: IpAddr) -> std::time::Duration {
        if !self.config.enabled {
            return std::time::Duration::ZERO;
        }
        let millis = self
            .config
            .tarpit_step_ms
            .saturating_mul(u64::from(self.failures(client)))
            .min(self.config.tarpit_max_ms);
        std::time::Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 20));

    fn is_tracked(throttle: &LoginThrottle, client: IpAddr) -> bool {
        throttle.records.contains_key(&client)
    }

    fn throttle() -> LoginThrottle {
        LoginThrottle::new(BruteForceConfig {
            enabled: true,
            max_attempts: 3,
            block_minutes: 30,
            wait_between: true,
            wait_between_secs: 30,
            tarpit_step_ms: 500,
            tarpit_max_ms: 1_200,
        })
    }

    #[test]
    fn init_creates_record() {
        let throttle = throttle();
        let now = Utc::now();
        assert!(!is_tracked(&throttle, CLIENT));
        throttle.init(CLIENT, now);
        assert!(is_tracked(&throttle, CLIENT));
        assert_eq!(throttle.failures(CLIENT), 0);
        assert!(throttle.check(CLIENT, now).is_ok());
    }

    #[test]
    fn wait_window_after_failure() {
        let throttle = throttle();
        let now = Utc::now();
        throttle.record_failure(CLIENT, now);

        let err = throttle.check(CLIENT, now + Duration::seconds(10)).unwrap_err();
        assert!(matches!(err, AuthError::MustWait { seconds: 20 }));
        assert!(throttle.check(CLIENT, now + Duration::seconds(31)).is_ok());
        assert!(throttle.check(OTHER, now).is_ok());
    }

    #[test]
    fn blocks_after_max_attempts() {
        let throttle = throttle();
        let now = Utc::now();
        for i in 0..3 {
            throttle.record_failure(CLIENT, now + Duration::minutes(i));
        }

        let later = now + Duration::minutes(5);
        assert!(matches!(throttle.check(CLIENT, later), Err(AuthError::Blocked { .. })));

        let after_block = now + Duration::minutes(2) + Duration::minutes(31);
        assert!(throttle.blocked_until(CLIENT, after_block).is_none());
    }

    #[test]
    fn init_drops_stale_records() {
        let throttle = throttle();
        let start = Utc::now();
        throttle.record_failure(OTHER, start);

        throttle.init(CLIENT, start + Duration::minutes(31));
        assert!(!is_tracked(&throttle, OTHER));
        assert!(is_tracked(&throttle, CLIENT));
    }

    #[test]
    fn clear_forgets_failures() {
        let throttle = throttle();
        throttle.record_failure(CLIENT, Utc::now());
        throttle.clear(CLIENT);
        assert_eq!(throttle.failures(CLIENT), 0);
    }

    #[test]
    fn tarpit_grows_and_caps() {
        let throttle = throttle();
        let now = Utc::now();
        assert_eq!(throttle.tarpit(CLIENT), std::time::Duration::ZERO);

        throttle.record_failure(CLIENT, now);
        assert_eq!(throttle.tarpit(CLIENT), std::time::Duration::from_millis(500));

        throttle.record_failure(CLIENT, now);
        throttle.record_failure(CLIENT, now);
        assert_eq!(throttle.tarpit(CLIENT), std::time::Duration::from_millis(1_200));
    }

    #[test]
    fn disabled_throttle_never_refuses() {
        let throttle = LoginThrottle::new(BruteForceConfig {
            enabled: false,
            ..BruteForceConfig::default()
        });
        let now = Utc::now();
        for _ in 0..10 {
            assert_eq!(throttle.record_failure(CLIENT, now), 0);
        }
        throttle.init(CLIENT, now);
        assert!(!is_tracked(&throttle, CLIENT));
        assert!(throttle.check(CLIENT, now).is_ok());
        assert_eq!(throttle.tarpit(CLIENT), std::time::Duration::ZERO);
    }
}
