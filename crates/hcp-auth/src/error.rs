//! Authentication error types.

use std::fmt;

/// Authentication operation errors.
#[derive(Debug)]
pub enum AuthError {
    /// Submitted data failed the input safety rules.
    InvalidInput {
        /// Name of the offending form field.
        field: &'static str,
        /// Which rule rejected it.
        reason: String,
    },
    /// Unknown user or wrong password.
    InvalidCredentials,
    /// Only administrators may log in while maintenance mode is on.
    Maintenance,
    /// User account is disabled.
    AccountDisabled,
    /// User account is suspended.
    AccountSuspended,
    /// Client address is blocked after repeated failures.
    Blocked {
        /// When the block expires.
        until: chrono::DateTime<chrono::Utc>,
    },
    /// Client must wait before the next attempt.
    MustWait {
        /// Remaining seconds.
        seconds: i64,
    },
    /// Internal error.
    Internal(String),
}

impl AuthError {
    /// Creates an input rule violation for `field`.
    #[must_use]
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Checks if the error counts as a failed login attempt.
    #[must_use]
    pub const fn is_failed_attempt(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { field, reason } => write!(f, "invalid input in {field}: {reason}"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Maintenance => write!(f, "login restricted to administrators during maintenance"),
            Self::AccountDisabled => write!(f, "user account is disabled"),
            Self::AccountSuspended => write!(f, "user account is suspended"),
            Self::Blocked { until } => write!(f, "client address is blocked until {until}"),
            Self::MustWait { seconds } => write!(f, "client must wait {seconds} seconds"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "invalid credentials");

        let err = AuthError::invalid_input("uname", "control character");
        assert_eq!(err.to_string(), "invalid input in uname: control character");
    }

    #[test]
    fn only_credential_errors_count_as_failures() {
        assert!(AuthError::InvalidCredentials.is_failed_attempt());
        assert!(!AuthError::Maintenance.is_failed_attempt());
        assert!(!AuthError::MustWait { seconds: 3 }.is_failed_attempt());
    }
}
