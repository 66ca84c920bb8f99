//! Build environment discovery for system libraries
//!
//! The assembler only records which libraries must come from the system.
//! This module runs those queries, typically through pkg-config, and merges
//! the answers into a [`FlagSet`]. It is the one place that leaves the
//! process, so it is kept out of [`crate::assemble()`].

use crate::assemble::{FlagSet, LibraryQuery};
use crate::profile::PlatformProfile;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Flags reported by the environment for one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbedFlags {
    pub defines: Vec<String>,
    pub compile_flags: Vec<String>,
    pub link_flags: Vec<String>,
    pub link_libraries: Vec<String>,
}

/// Something that can answer library queries
pub trait LibraryProbe {
    fn probe(&self, query: &LibraryQuery) -> Result<ProbedFlags>;
}

/// pkg-config settings for cross-compilation
#[derive(Debug, Clone, Default, Serialize)]
pub struct PkgConfigSettings {
    /// Search path for .pc files
    pub path: Vec<PathBuf>,
    /// Sysroot for pkg-config
    pub sysroot: Option<PathBuf>,
    /// Disable default search paths
    pub disable_default: bool,
}

impl PkgConfigSettings {
    /// Create pkg-config settings for a sysroot
    pub fn for_sysroot(sysroot: &Path) -> Self {
        Self {
            path: vec![
                sysroot.join("usr/lib/pkgconfig"),
                sysroot.join("usr/share/pkgconfig"),
            ],
            sysroot: Some(sysroot.to_path_buf()),
            disable_default: true,
        }
    }

    /// Get environment variables for pkg-config
    pub fn get_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        if !self.path.is_empty() {
            let path_str: Vec<String> = self
                .path
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect();
            env.insert("PKG_CONFIG_PATH".to_string(), path_str.join(":"));

            if self.disable_default {
                env.insert("PKG_CONFIG_LIBDIR".to_string(), path_str.join(":"));
            }
        }

        if let Some(ref sysroot) = self.sysroot {
            env.insert(
                "PKG_CONFIG_SYSROOT_DIR".to_string(),
                sysroot.to_string_lossy().to_string(),
            );
        }

        env
    }
}

/// pkg-config backed probe
#[derive(Debug, Clone)]
pub struct PkgConfig {
    binary: PathBuf,
    settings: PkgConfigSettings,
}

impl PkgConfig {
    /// Use an explicit pkg-config binary
    pub fn new(binary: impl Into<PathBuf>, settings: PkgConfigSettings) -> Self {
        Self {
            binary: binary.into(),
            settings,
        }
    }

    /// Find pkg-config via `PKG_CONFIG` or `PATH`
    pub fn locate(settings: PkgConfigSettings) -> Result<Self> {
        let binary = match std::env::var_os("PKG_CONFIG") {
            Some(path) => PathBuf::from(path),
            None => which::which("pkg-config")?,
        };
        tracing::debug!("using {}", binary.display());
        Ok(Self::new(binary, settings))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, query: &LibraryQuery) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--cflags", "--libs"])
            .args(&query.packages)
            .envs(self.settings.get_env());
        cmd
    }
}

impl LibraryProbe for PkgConfig {
    fn probe(&self, query: &LibraryQuery) -> Result<ProbedFlags> {
        tracing::debug!(
            "pkg-config --cflags --libs {}",
            query.packages.join(" ")
        );

        let output = self
            .command(query)
            .output()
            .map_err(|e| Error::Discovery {
                library: query.library,
                message: format!("failed to run {}: {}", self.binary.display(), e),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Discovery {
                library: query.library,
                message: stderr.trim().to_string(),
            });
        }

        Ok(parse_flags(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Compiler options whose value is always the next argument
const COMPILE_PAIRS: &[&str] = &["-isystem", "-include", "-idirafter", "-iquote", "-imacros"];

/// Linker options whose value is always the next argument
const LINK_PAIRS: &[&str] = &["-framework", "-Xlinker"];

fn takes_separate_value(arg: &str) -> bool {
    COMPILE_PAIRS.contains(&arg) || LINK_PAIRS.contains(&arg)
}

/// Sort compiler/linker arguments into their kinds
///
/// `-D`, `-I`, `-L` and `-l` may be given with the value attached or as the
/// next argument. Options such as `-isystem` always take the next argument
/// and stay paired with it. Arguments that are not options are treated as
/// libraries.
pub fn parse_flags(output: &str) -> ProbedFlags {
    let mut flags = ProbedFlags::default();
    let mut args = output.split_whitespace();

    while let Some(arg) = args.next() {
        if takes_separate_value(arg) {
            let target = if COMPILE_PAIRS.contains(&arg) {
                &mut flags.compile_flags
            } else {
                &mut flags.link_flags
            };
            target.push(arg.to_string());
            target.extend(args.next().map(str::to_string));
            continue;
        }

        let mut value = |prefix: &str| -> Option<String> {
            let rest = arg.strip_prefix(prefix)?;
            if rest.is_empty() {
                args.next().map(str::to_string)
            } else {
                Some(rest.to_string())
            }
        };

        if let Some(define) = value("-D") {
            flags.defines.push(define);
        } else if let Some(dir) = value("-I") {
            flags.compile_flags.push(format!("-I{}", dir));
        } else if let Some(dir) = value("-L") {
            flags.link_flags.push(format!("-L{}", dir));
        } else if let Some(lib) = value("-l") {
            flags.link_libraries.push(lib);
        } else if arg == "-pthread" {
            flags.compile_flags.push(arg.to_string());
            flags.link_flags.push(arg.to_string());
        } else if arg.starts_with("-Wl,") {
            flags.link_flags.push(arg.to_string());
        } else if arg.starts_with('-') {
            flags.compile_flags.push(arg.to_string());
        } else {
            flags.link_libraries.push(arg.to_string());
        }
    }

    flags
}

/// Append flags not already present, comparing option/value pairs as a unit
fn merge_unique(target: &mut Vec<String>, items: Vec<String>) {
    let mut items = items.into_iter();

    while let Some(item) = items.next() {
        if takes_separate_value(&item) {
            let value = items.next();
            let present = match &value {
                Some(value) => target
                    .windows(2)
                    .any(|pair| pair[0] == item && pair[1] == *value),
                None => target.contains(&item),
            };
            if !present {
                target.push(item);
                target.extend(value);
            }
        } else if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Run every pending query and merge the answers
///
/// Discovered libraries go right after the profile's entry libraries, in
/// query order, so dependents still precede what they depend on. The input
/// is left untouched; on error nothing is returned.
pub fn apply_discovery(
    flags: &FlagSet,
    probe: &dyn LibraryProbe,
    profile: &PlatformProfile,
) -> Result<FlagSet> {
    let mut merged = flags.clone();
    let mut libraries = Vec::new();

    for query in &flags.discovery {
        let probed = probe.probe(query)?;
        tracing::debug!(
            "{}: {} defines, {} libraries",
            query.library,
            probed.defines.len(),
            probed.link_libraries.len()
        );

        merge_unique(&mut merged.defines, probed.defines);
        merge_unique(&mut merged.compile_flags, probed.compile_flags);
        merge_unique(&mut merged.link_flags, probed.link_flags);
        for lib in probed.link_libraries {
            if !libraries.contains(&lib) && !merged.link_libraries.contains(&lib) {
                libraries.push(lib);
            }
        }
    }

    let at = profile.libraries.entry.len().min(merged.link_libraries.len());
    let tail = merged.link_libraries.split_off(at);
    merged.link_libraries.extend(libraries);
    merged.link_libraries.extend(tail);
    merged.discovery.clear();

    Ok(merged)
}
