//! # hcp-auth
//!
//! Credential checking for the hosting control panel login.
//!
//! ## Features
//!
//! - Input safety rules and IDN normalization of submitted user names
//! - Argon2id password hashing
//! - User store abstraction with an in-memory implementation
//! - Per-address brute force throttling
//! - The [`CredentialAuthenticator`] tying these together
//!
//! ## Example
//!
//! ```ignore
//! use hcp_auth::{input, CredentialAuthenticator, LoginAttempt};
//!
//! let name = input::normalize_username("admin@bücher.example")?;
//! input::check_input("uname", &name)?;
//! let user = authenticator.authenticate(&LoginAttempt::new(&name, "secret", ip)).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod authenticator;
pub mod error;
pub mod input;
pub mod password;
pub mod throttle;
pub mod user;

pub use authenticator::{Authenticator, CredentialAuthenticator, LoginAttempt};
pub use error::{AuthError, AuthResult};
pub use password::{HashPolicy, PasswordService};
pub use throttle::LoginThrottle;
pub use user::{MemoryUserStore, UserLevel, UserRecord, UserStatus, UserStore};
