//! Panel users and the user store.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::password::PasswordService;

/// Panel user level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    /// Panel administrator.
    Admin,
    /// Reseller managing client accounts.
    Reseller,
    /// Hosting client.
    #[serde(rename = "user")]
    Client,
}

impl UserLevel {
    /// Returns the stored form of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Reseller => "reseller",
            Self::Client => "user",
        }
    }
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserLevel {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "reseller" => Ok(Self::Reseller),
            "user" => Ok(Self::Client),
            other => Err(AuthError::Internal(format!("unknown user level: {other}"))),
        }
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account may log in.
    #[default]
    Active,
    /// Account was disabled by an administrator.
    Disabled,
    /// Account was suspended, e.g. for exceeding limits.
    Suspended,
}

/// A panel user as kept by the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: Uuid,
    /// Login name (IDN ASCII form).
    pub name: String,
    /// Argon2 PHC password hash.
    pub password_hash: String,
    /// User level.
    pub level: UserLevel,
    /// Account status.
    pub status: UserStatus,
}

impl UserRecord {
    /// Checks if the account may log in.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }
}

/// Lookup of panel users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by login name.
    async fn find_by_name(&self, name: &str) -> AuthResult<Option<UserRecord>>;
}

/// In-process user store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserRecord>,
    passwords: PasswordService,
}

impl MemoryUserStore {
    /// Creates an empty store hashing with `passwords`.
    #[must_use]
    pub fn new(passwords: PasswordService) -> Self {
        Self {
            users: DashMap::new(),
            passwords,
        }
    }

    /// Adds an active user, hashing the password.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn add_user(&self, name: &str, password: &str, level: UserLevel) -> AuthResult<UserRecord> {
        let record = UserRecord {
            id: Uuid::now_v7(),
            name: name.to_string(),
            password_hash: self.passwords.hash(password)?,
            level,
            status: UserStatus::Active,
        };
        self.users.insert(record.name.clone(), record.clone());
        Ok(record)
    }

    /// Changes the status of an existing user. Returns `false` when the user
    /// is unknown.
    pub fn set_status(&self, name: &str, status: UserStatus) -> bool {
        match self.users.get_mut(name) {
            Some(mut user) => {
                user.status = status;
                true
            }
            None => false,
        }
    }

    /// Removes a user.
    pub fn remove_user(&self, name: &str) -> Option<UserRecord> {
        self.users.remove(name).map(|(_, user)| user)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_name(&self, name: &str) -> AuthResult<Option<UserRecord>> {
        Ok(self.users.get(name).map(|u| u.value().clone()))
    }
}
