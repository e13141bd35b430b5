//! # hcp-session
//!
//! Login sessions for the hosting control panel.
//!
//! A [`Session`] is created on a visitor's first request and carries the
//! authenticated [`Identity`] once the visitor logs in. Sessions are kept in
//! a [`SessionStore`]; [`MemorySessionStore`] is the in-process
//! implementation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod session;
pub mod store;

pub use error::{SessionError, SessionResult};
pub use session::{Identity, Session, SessionState};
pub use store::{MemorySessionStore, SessionStore};
