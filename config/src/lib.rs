//! symconf option handling
//!
//! This crate owns everything between raw option input and a complete,
//! typed option set:
//!
//! - [`declare`]: the fixed table of recognized options, domains and defaults
//! - [`options`]: typed axes ([`BuildMode`], [`AbiVariant`], ...) and [`OptionSet`]
//! - [`normalize`](mod@normalize): default substitution and validation
//! - [`loader`]: reading options from a TOML file and the environment
//!
//! # Quick Start
//!
//! ```rust
//! use symconf_config::{normalize, BuildMode, RawOptions};
//!
//! let raw = RawOptions::new()
//!     .with("build_mode", "release")
//!     .with("use_system_ogg", "yes");
//!
//! let options = normalize(&raw).unwrap();
//! assert_eq!(options.build_mode, BuildMode::Release);
//! ```

pub mod declare;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod options;

pub use declare::{OptionDecl, OptionKind, OPTIONS};
pub use error::{ConfigError, Result};
pub use loader::{apply_env_overrides, get_config_path, parse_options, ConfigLoader};
pub use normalize::{normalize, RawOptions, RawValue};
pub use options::{
    AbiVariant, BuildMode, LibrarySource, LibrarySources, OptionSet, SystemLibrary, WordSize,
};
