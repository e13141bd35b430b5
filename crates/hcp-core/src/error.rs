//! Error handling for the control panel.

use thiserror::Error;

/// Result type alias using the panel error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for panel operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_setting() {
        let error = Error::Config("session timeout must be positive".to_string());
        assert_eq!(
            error.to_string(),
            "configuration error: session timeout must be positive"
        );
    }
}
