//! # hcp-core
//!
//! Core configuration, error handling and audit events for the hosting
//! control panel.
//!
//! This crate provides the foundational types shared by the session,
//! authentication and server crates:
//!
//! - [`PanelConfig`] - read-only panel settings handed to the login gate
//! - [`Error`] - the panel-wide error type
//! - [`event`] - audit event records
//! - [`i18n`] - message translation
//! - [`update`] - pending database update detection

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod i18n;
pub mod update;

pub use config::{BruteForceConfig, LandingPages, MaintenanceConfig, PanelConfig, ProductBranding};
pub use error::{Error, Result};
pub use i18n::{Catalog, Translator};
pub use update::{DatabaseUpdate, UpdateProbe};
