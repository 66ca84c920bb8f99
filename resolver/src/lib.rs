//! symconf resolver
//!
//! Resolves a raw option bag into the compiler and linker inputs for a
//! Symbian cross build. The pipeline is pure and runs strictly left to right:
//!
//! ```text
//! RawOptions --normalize--> OptionSet --rules::resolve--> OptionSet --assemble--> FlagSet
//! ```
//!
//! - [`rules`]: dependency chain between system libraries
//! - [`profile`]: the constant target description
//! - [`assemble`](mod@assemble): per-axis flag contributions
//! - [`discovery`]: optional pkg-config step for system libraries
//!
//! # Example
//!
//! ```rust
//! use symconf_config::{RawOptions, SystemLibrary};
//! use symconf_resolver::{resolve_flags, PlatformProfile};
//!
//! let raw = RawOptions::new()
//!     .with("build_mode", "release")
//!     .with("use_system_theora", "yes");
//!
//! let resolution = resolve_flags(&raw, PlatformProfile::symbian()).unwrap();
//! assert!(resolution.options.libraries.is_system(SystemLibrary::Ogg));
//! assert_eq!(resolution.flags.link_libraries.last().map(String::as_str), Some("gcc"));
//! ```

pub mod assemble;
pub mod discovery;
pub mod error;
pub mod profile;
pub mod rules;

pub use assemble::{assemble, FlagSet, LibraryQuery};
pub use discovery::{
    apply_discovery, parse_flags, LibraryProbe, PkgConfig, PkgConfigSettings, ProbedFlags,
};
pub use error::{Error, Result};
pub use profile::{PlatformProfile, TargetTriplet};
pub use rules::{apply_rules, resolve, DependencyRule, DEPENDENCY_RULES};

use serde::Serialize;
use symconf_config::{normalize, OptionSet, RawOptions};

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Options after normalization and dependency forcing
    pub options: OptionSet,
    pub flags: FlagSet,
}

impl Resolution {
    /// Run the pending discovery queries and merge their flags
    pub fn probe(self, probe: &dyn LibraryProbe, profile: &PlatformProfile) -> Result<Resolution> {
        let flags = apply_discovery(&self.flags, probe, profile)?;
        Ok(Resolution {
            options: self.options,
            flags,
        })
    }
}

/// Normalize, resolve and assemble in one go
pub fn resolve_flags(raw: &RawOptions, profile: &PlatformProfile) -> Result<Resolution> {
    let normalized = normalize(raw)?;
    let options = resolve(&normalized);
    let flags = assemble(&options, profile);

    Ok(Resolution { options, flags })
}
