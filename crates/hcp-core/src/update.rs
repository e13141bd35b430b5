//! Pending database update detection.
//!
//! While the panel database lags behind the schema revision shipped with the
//! running build, the login page shows the maintenance notice to everyone
//! except administrators.

/// Reports whether a system update is waiting to be applied.
pub trait UpdateProbe: Send + Sync {
    /// Returns `true` when an update is pending.
    fn is_update_available(&self) -> bool;
}

/// Compares the applied database revision with the latest known revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseUpdate {
    applied: u32,
    latest: u32,
}

impl DatabaseUpdate {
    /// Creates a probe for the given applied and latest revisions.
    #[must_use]
    pub const fn new(applied: u32, latest: u32) -> Self {
        Self { applied, latest }
    }

    /// Creates a probe that never reports a pending update.
    #[must_use]
    pub const fn up_to_date() -> Self {
        Self::new(0, 0)
    }
}

impl UpdateProbe for DatabaseUpdate {
    fn is_update_available(&self) -> bool {
        self.applied < self.latest
    }
}
