//! Crate-level error type for configuration and input validation.
//!
//! Provider failures have their own type in [`crate::provider::ProviderError`]
//! and never escape the aggregator.

use thiserror::Error;

/// Errors raised while loading configuration or validating user input.
#[derive(Error, Debug)]
pub enum AqmapError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl AqmapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AqmapError::Config { .. } => {
                "Configuration error. Please check your .aqmap.toml and WAQI token.".to_string()
            }
            AqmapError::Validation { message } => format!("Invalid input: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = AqmapError::config("bad region");
        assert!(matches!(config_err, AqmapError::Config { .. }));

        let validation_err = AqmapError::validation("south above north");
        assert!(matches!(validation_err, AqmapError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        assert!(AqmapError::config("x")
            .user_message()
            .contains("Configuration error"));
        assert!(AqmapError::validation("lat 91")
            .user_message()
            .contains("lat 91"));
    }
}
