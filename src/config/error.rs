//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Missing required setting: {0}")]
    MissingField(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_file() {
        let err = ConfigError::Parse {
            path: PathBuf::from("pulseboard.toml"),
            message: "expected `=`".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to parse pulseboard.toml: expected `=`");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::invalid("server.port", "port must be non-zero");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'server.port': port must be non-zero"
        );
    }
}
