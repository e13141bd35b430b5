//! Credential authentication.
//!
//! [`CredentialAuthenticator`] checks a submitted user name and password
//! against the [`UserStore`], honouring the brute force throttle and the
//! maintenance-mode restriction:
//!
//! 1. a blocked or waiting client is refused without a store lookup;
//! 2. unknown users and wrong passwords are the same generic failure and
//!    count against the client address;
//! 3. during maintenance only administrators may log in;
//! 4. disabled or suspended accounts are refused;
//! 5. success clears the client's failure record.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hcp_core::event::{Event, EventType};

use crate::error::{AuthError, AuthResult};
use crate::password::PasswordService;
use crate::throttle::LoginThrottle;
use crate::user::{UserLevel, UserRecord, UserStatus, UserStore};

/// A single login attempt.
#[derive(Debug, Clone, Copy)]
pub struct LoginAttempt<'a> {
    /// IDN-normalized user name.
    pub user_name: &'a str,
    /// Submitted password.
    pub password: &'a str,
    /// Client address.
    pub client: IpAddr,
    /// Whether maintenance mode is on.
    pub maintenance: bool,
}

impl<'a> LoginAttempt<'a> {
    /// Creates an attempt outside maintenance mode.
    #[must_use]
    pub const fn new(user_name: &'a str, password: &'a str, client: IpAddr) -> Self {
        Self {
            user_name,
            password,
            client,
            maintenance: false,
        }
    }

    /// Sets the maintenance flag.
    #[must_use]
    pub const fn in_maintenance(mut self, maintenance: bool) -> Self {
        self.maintenance = maintenance;
        self
    }
}

/// Verifies login attempts.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticates an attempt, returning the user on success.
    async fn authenticate(&self, attempt: &LoginAttempt<'_>) -> AuthResult<UserRecord>;

    /// Looks up a user that is already logged in, to revalidate a session.
    async fn revalidate(&self, user_name: &str) -> AuthResult<Option<UserRecord>>;
}

/// Password authenticator backed by a [`UserStore`].
pub struct CredentialAuthenticator {
    users: Arc<dyn UserStore>,
    passwords: PasswordService,
    throttle: Arc<LoginThrottle>,
}

impl CredentialAuthenticator {
    /// Creates an authenticator.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        passwords: PasswordService,
        throttle: Arc<LoginThrottle>,
    ) -> Self {
        Self {
            users,
            passwords,
            throttle,
        }
    }

    fn reject(&self, attempt: &LoginAttempt<'_>, reason: &str) -> AuthError {
        let failures = self.throttle.record_failure(attempt.client, Utc::now());
        Event::builder(EventType::LoginError)
            .failure(reason)
            .user(attempt.user_name)
            .ip_address(attempt.client)
            .detail("failures", failures.to_string())
            .emit();
        if self.throttle.blocked_until(attempt.client, Utc::now()).is_some() {
            Event::builder(EventType::AddressBlocked)
                .ip_address(attempt.client)
                .emit();
        }
        AuthError::InvalidCredentials
    }
}

#[async_trait]
impl Authenticator for CredentialAuthenticator {
    async fn authenticate(&self, attempt: &LoginAttempt<'_>) -> AuthResult<UserRecord> {
        self.throttle.check(attempt.client, Utc::now())?;

        let Some(user) = self.users.find_by_name(attempt.user_name).await? else {
            tracing::info!(user = attempt.user_name, client = %attempt.client, "login with unknown user name");
            return Err(self.reject(attempt, "unknown user name"));
        };

        match self.passwords.verify(attempt.password, &user.password_hash) {
            Ok(()) => {}
            Err(AuthError::InvalidCredentials) => {
                tracing::info!(user = attempt.user_name, client = %attempt.client, "incorrect password");
                return Err(self.reject(attempt, "incorrect password"));
            }
            Err(e) => return Err(e),
        }

        if attempt.maintenance && user.level != UserLevel::Admin {
            tracing::info!(user = attempt.user_name, "login refused during maintenance");
            return Err(AuthError::Maintenance);
        }

        match user.status {
            UserStatus::Active => {}
            UserStatus::Disabled => return Err(AuthError::AccountDisabled),
            UserStatus::Suspended => return Err(AuthError::AccountSuspended),
        }

        self.throttle.clear(attempt.client);
        Ok(user)
    }

    async fn revalidate(&self, user_name: &str) -> AuthResult<Option<UserRecord>> {
        Ok(self
            .users
            .find_by_name(user_name)
            .await?
            .filter(UserRecord::is_active))
    }
}
