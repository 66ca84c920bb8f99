//! Flag assembly
//!
//! Turns a resolved [`OptionSet`] into a [`FlagSet`]. Each axis contributes
//! its slice in a fixed order:
//!
//! 1. build mode: optimization flags, debug defines
//! 2. ABI variant: ABI and graphics capability defines
//! 3. system libraries: one discovery query per library taken from the system
//! 4. platform: base defines, include paths, toolchain quirks, link flags and
//!    the base link libraries
//!
//! The link-library list is built group by group; its order is what the
//! target linker sees and must not be rearranged downstream.

use crate::profile::{join_path, PlatformProfile};
use serde::Serialize;
use symconf_config::{OptionSet, SystemLibrary};

/// A request to ask the build environment for a library's flags
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LibraryQuery {
    pub library: SystemLibrary,
    /// pkg-config packages to query together
    pub packages: Vec<String>,
}

impl LibraryQuery {
    pub fn for_library(library: SystemLibrary) -> Self {
        Self {
            library,
            packages: library
                .pkg_config_packages()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Resolved compiler and linker inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlagSet {
    /// Preprocessor definitions without the `-D` prefix
    pub defines: Vec<String>,
    /// Flags for both C and C++ compilation
    pub compile_flags: Vec<String>,
    /// Flags for C compilation only
    pub c_flags: Vec<String>,
    pub link_flags: Vec<String>,
    /// Libraries in link order, without the `-l` prefix
    pub link_libraries: Vec<String>,
    /// Environment queries still to run, in dependency order
    pub discovery: Vec<LibraryQuery>,
}

impl FlagSet {
    /// Defines rendered as `-D` arguments
    pub fn cpp_flags(&self) -> Vec<String> {
        self.defines.iter().map(|d| format!("-D{}", d)).collect()
    }

    /// Libraries rendered as `-l` arguments
    pub fn lib_args(&self) -> Vec<String> {
        self.link_libraries
            .iter()
            .map(|l| format!("-l{}", l))
            .collect()
    }

    /// Check if a define is present, exactly as written
    pub fn has_define(&self, define: &str) -> bool {
        self.defines.iter().any(|d| d == define)
    }

    /// Libraries queried from the environment, in query order
    pub fn discovered_libraries(&self) -> impl Iterator<Item = SystemLibrary> + '_ {
        self.discovery.iter().map(|q| q.library)
    }
}

fn push_all(target: &mut Vec<String>, items: &[&str]) {
    target.extend(items.iter().map(|s| s.to_string()));
}

/// Assemble the flag set for resolved options
pub fn assemble(options: &OptionSet, profile: &PlatformProfile) -> FlagSet {
    debug_assert!(profile.abi_defines_disjoint());

    let mut flags = FlagSet::default();

    let mode = profile.mode(options.build_mode);
    push_all(&mut flags.compile_flags, mode.compile_flags);
    push_all(&mut flags.defines, mode.defines);
    tracing::trace!(build_mode = %options.build_mode, "applied build mode");

    let abi = profile.abi(options.abi_variant);
    push_all(&mut flags.defines, abi.defines);
    push_all(&mut flags.defines, abi.graphics_defines);
    tracing::trace!(abi_variant = %options.abi_variant, "applied ABI variant");

    for library in options.libraries.system() {
        tracing::trace!("{} taken from the build environment", library);
        flags.discovery.push(LibraryQuery::for_library(library));
    }

    add_platform(&mut flags, options, profile);

    tracing::debug!(
        defines = flags.defines.len(),
        compile_flags = flags.compile_flags.len(),
        link_libraries = flags.link_libraries.len(),
        discovery = flags.discovery.len(),
        "assembled flag set"
    );

    flags
}

fn add_platform(flags: &mut FlagSet, options: &OptionSet, profile: &PlatformProfile) {
    let sdk = options.sdk_root.as_str();
    let abi = profile.abi(options.abi_variant);

    push_all(&mut flags.defines, profile.defines);
    flags.defines.push(format!(
        "__PRODUCT_INCLUDE__=\"{}\"",
        join_path(sdk, profile.product_include)
    ));

    let mut includes = vec![options.companion_root.clone()];
    includes.extend(profile.sdk_includes.iter().map(|dir| join_path(sdk, dir)));
    includes.push(join_path(sdk, abi.stl_include));
    includes.extend(
        profile
            .sdk_includes_tail
            .iter()
            .map(|dir| join_path(sdk, dir)),
    );
    for dir in includes {
        flags.compile_flags.push("-isystem".to_string());
        flags.compile_flags.push(dir);
    }
    flags.compile_flags.push("-include".to_string());
    flags
        .compile_flags
        .push(join_path(sdk, profile.forced_include));
    push_all(&mut flags.compile_flags, profile.compile_flags);
    push_all(&mut flags.c_flags, profile.c_flags);

    push_all(&mut flags.link_flags, profile.link_flags);
    flags.link_flags.push(format!("-Wl,-Map={}", options.map_file));
    match options.toolchain_root() {
        Some(root) => {
            for dir in profile.toolchain_lib_dirs(root) {
                flags.link_flags.push(format!("-L{}", dir));
            }
        }
        None => tracing::warn!(
            "cannot derive toolchain root from '{}', toolchain library paths omitted",
            options.cxx
        ),
    }
    for dir in profile.sdk_lib_dirs {
        flags.link_flags.push(format!("-L{}", join_path(sdk, dir)));
    }

    let libs = &profile.libraries;
    for group in [
        libs.entry,
        abi.cxx_runtime,
        libs.posix,
        abi.realtime_libs,
        libs.framework,
        abi.graphics_libs,
        libs.utility,
        libs.toolchain_support,
    ] {
        push_all(&mut flags.link_libraries, group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symconf_config::{normalize, RawOptions};

    fn assemble_raw(raw: RawOptions) -> FlagSet {
        let options = normalize(&raw).unwrap();
        assemble(&options, PlatformProfile::symbian())
    }

    fn base(mode: &str, abi: &str) -> RawOptions {
        RawOptions::new()
            .with("build_mode", mode)
            .with("abi_variant", abi)
            .with("sdk_root", "/sdk")
            .with("companion_root", "/proj")
    }

    #[test]
    fn test_cpp_flags_and_lib_args() {
        let flags = FlagSet {
            defines: vec!["NDEBUG".to_string(), "_POSIX_C_SOURCE=200112".to_string()],
            link_libraries: vec![":libc.dso".to_string(), "gcc".to_string()],
            ..FlagSet::default()
        };
        assert_eq!(flags.cpp_flags(), vec!["-DNDEBUG", "-D_POSIX_C_SOURCE=200112"]);
        assert_eq!(flags.lib_args(), vec!["-l:libc.dso", "-lgcc"]);
    }

    #[test]
    fn test_include_paths() {
        let flags = assemble_raw(base("release", "legacy"));
        let includes: Vec<_> = flags
            .compile_flags
            .windows(2)
            .filter(|w| w[0] == "-isystem")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(
            includes,
            vec![
                "/proj",
                "/sdk/epoc32/include/platform/mw",
                "/sdk/epoc32/include/platform",
                "/sdk/epoc32/include/mw",
                "/sdk/epoc32/include/stdapis",
                "/sdk/epoc32/include/stdapis/stlport",
                "/sdk/epoc32/include",
            ]
        );
    }

    #[test]
    fn test_current_abi_uses_stlport_v5() {
        let flags = assemble_raw(base("release", "current"));
        assert!(flags
            .compile_flags
            .contains(&"/sdk/epoc32/include/stdapis/stlportv5".to_string()));
        assert!(!flags
            .compile_flags
            .contains(&"/sdk/epoc32/include/stdapis/stlport".to_string()));
    }

    #[test]
    fn test_product_include_define() {
        let flags = assemble_raw(base("debug", "current"));
        assert!(flags.has_define(
            "__PRODUCT_INCLUDE__=\"/sdk/epoc32/include/variant/symbian_os.hrh\""
        ));
        let forced = flags
            .compile_flags
            .iter()
            .position(|f| f == "-include")
            .unwrap();
        assert_eq!(
            flags.compile_flags[forced + 1],
            "/sdk/epoc32/include/gcce/gcce.h"
        );
    }

    #[test]
    fn test_toolchain_lib_dirs_from_cxx() {
        let flags = assemble_raw(
            base("release", "current").with("cxx", "/opt/gcc/bin/arm-none-symbianelf-g++"),
        );
        assert!(flags
            .link_flags
            .contains(&"-L/opt/gcc/lib/gcc/arm-none-symbianelf/12.1.0".to_string()));
        assert!(flags
            .link_flags
            .contains(&"-L/opt/gcc/arm-none-symbianelf/lib".to_string()));

        let flags = assemble_raw(base("release", "current"));
        assert!(!flags.link_flags.iter().any(|f| f.contains("/lib/gcc/")));
        assert!(flags
            .link_flags
            .contains(&"-L/sdk/epoc32/release/armv5/udeb".to_string()));
    }

    #[test]
    fn test_map_file() {
        let flags = assemble_raw(base("release", "current").with("map_file", "out/game.map"));
        assert!(flags.link_flags.contains(&"-Wl,-Map=out/game.map".to_string()));
    }

    #[test]
    fn test_bundled_libraries_add_no_queries() {
        let flags = assemble_raw(base("release", "current"));
        assert!(flags.discovery.is_empty());
    }

    #[test]
    fn test_library_query_packages() {
        let query = LibraryQuery::for_library(SystemLibrary::Theora);
        assert_eq!(query.packages, vec!["theora", "theoradec"]);
    }
}
