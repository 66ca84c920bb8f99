//! Error types for option loading and normalization

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Invalid value '{got}' for option '{name}' (allowed: {})", .allowed.join(", "))]
    InvalidOptionValue {
        name: String,
        got: String,
        allowed: Vec<String>,
    },

    #[error("Missing value for option: {0}")]
    MissingOption(String),

    #[error("Unknown build mode: {}", .0.as_deref().unwrap_or("(unset)"))]
    UnknownBuildMode(Option<String>),

    #[error("Environment variable {0} is not valid UTF-8")]
    NonUnicodeEnv(String),

    #[error("Invalid path for option '{name}': {reason}")]
    InvalidPath { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid_value(name: &str, got: &str, allowed: &[&str]) -> Self {
        ConfigError::InvalidOptionValue {
            name: name.to_string(),
            got: got.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
