//! Error types for configuration loading and validation.

use thiserror::Error;

/// Errors raised before the pipeline starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config sources could not be read or deserialized
    #[error("Configuration error: {0}")]
    Load(String),

    /// A value is present but unusable
    #[error("Invalid option {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid("batch_size", "must be > 0");
        assert_eq!(err.to_string(), "Invalid option batch_size: must be > 0");

        let err = ConfigError::Load("missing file".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing file");
    }
}
