//! Error types for flag resolution

use symconf_config::{ConfigError, SystemLibrary};
use thiserror::Error;

/// Resolution errors
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("pkg-config not found: {0}")]
    PkgConfigNotFound(#[from] which::Error),

    #[error("Failed to query build environment for {library}: {message}")]
    Discovery {
        library: SystemLibrary,
        message: String,
    },

    #[error("Platform profile invariant violated: {0}")]
    Profile(String),
}

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, Error>;
