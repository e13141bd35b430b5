//! Password hashing and verification using Argon2id.
//!
//! Hashes are stored in PHC string format, so the parameters travel with
//! each hash and older hashes keep verifying after the policy changes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::{AuthError, AuthResult};

/// Argon2id cost parameters.
#[derive(Debug, Clone)]
pub struct HashPolicy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for HashPolicy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl HashPolicy {
    /// Cheap parameters for tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn hasher(&self) -> AuthResult<Argon2<'static>> {
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hashes and verifies user passwords.
#[derive(Debug, Clone, Default)]
pub struct PasswordService {
    policy: HashPolicy,
}

impl PasswordService {
    /// Creates a password service with the given policy.
    #[must_use]
    pub const fn new(policy: HashPolicy) -> Self {
        Self { policy }
    }

    /// Hashes a password into a PHC string.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy parameters are invalid.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .policy
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored PHC string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on mismatch and
    /// [`AuthError::Internal`] when the stored hash is malformed.
    pub fn verify(&self, password: &str, stored: &str) -> AuthResult<()> {
        let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Internal(e.to_string()))?;

        // Parameters come from the PHC string, not from the current policy.
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(HashPolicy::for_testing())
    }

    #[test]
    fn hash_and_verify() {
        let passwords = service();
        let hash = passwords.hash("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify("correct horse battery staple", &hash).is_ok());
        assert!(matches!(
            passwords.verify("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let passwords = service();
        assert_ne!(passwords.hash("pw").unwrap(), passwords.hash("pw").unwrap());
    }

    #[test]
    fn hash_from_other_policy_still_verifies() {
        let hash = service().hash("pw").unwrap();
        let stronger = PasswordService::new(HashPolicy {
            memory_cost: 2048,
            time_cost: 2,
            parallelism: 1,
        });
        assert!(stronger.verify("pw", &hash).is_ok());
    }

    #[test]
    fn malformed_hash_is_internal_error() {
        assert!(matches!(
            service().verify("pw", "not-a-phc-string"),
            Err(AuthError::Internal(_))
        ));
    }
}
