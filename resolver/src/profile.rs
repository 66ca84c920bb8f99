//! Target platform profile
//!
//! Describes the Symbian GCCE/EABI target: the target triplet and toolchain
//! layout, the flags every build needs, and the contribution tables for the
//! build-mode and ABI-variant axes. The profile is constant data; nothing
//! here depends on user options except through explicit parameters.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use symconf_config::{AbiVariant, BuildMode};

/// Target architecture triplet (e.g., arm-none-symbianelf)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TargetTriplet {
    /// Architecture (e.g., arm)
    pub arch: &'static str,
    /// Vendor (e.g., none)
    pub vendor: &'static str,
    /// Operating system and object format (e.g., symbianelf)
    pub os: &'static str,
}

impl TargetTriplet {
    pub const fn new(arch: &'static str, vendor: &'static str, os: &'static str) -> Self {
        Self { arch, vendor, os }
    }

    /// Prefix of the cross tools (e.g., arm-none-symbianelf-g++)
    pub fn tool(&self, name: &str) -> String {
        format!("{}-{}", self, name)
    }
}

impl std::fmt::Display for TargetTriplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.vendor, self.os)
    }
}

/// Flags contributed by one build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeContribution {
    pub compile_flags: &'static [&'static str],
    pub defines: &'static [&'static str],
}

/// Everything that differs between the two OS ABIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbiContribution {
    pub defines: &'static [&'static str],
    pub graphics_defines: &'static [&'static str],
    /// STL port headers, relative to the SDK root
    pub stl_include: &'static str,
    /// C++ standard library
    pub cxx_runtime: &'static [&'static str],
    /// Real-time support, linked after the POSIX libraries
    pub realtime_libs: &'static [&'static str],
    /// GLES2/EGL, linked after the framework libraries
    pub graphics_libs: &'static [&'static str],
}

/// Base link libraries, grouped in link order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkGroups {
    /// Entry point and startup code, always first
    pub entry: &'static [&'static str],
    pub posix: &'static [&'static str],
    pub framework: &'static [&'static str],
    pub utility: &'static [&'static str],
    /// Compiler runtime support, always last
    pub toolchain_support: &'static [&'static str],
}

/// Constant description of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    pub name: &'static str,
    pub triplet: TargetTriplet,
    pub gcc_version: &'static str,

    pub release: ModeContribution,
    pub release_debug: ModeContribution,
    pub debug: ModeContribution,

    pub legacy: AbiContribution,
    pub current: AbiContribution,

    /// Defines applied to every build
    pub defines: &'static [&'static str],
    /// Header pulled in via `__PRODUCT_INCLUDE__`, relative to the SDK root
    pub product_include: &'static str,
    /// System include dirs before the STL port, relative to the SDK root
    pub sdk_includes: &'static [&'static str],
    /// System include dirs after the STL port, relative to the SDK root
    pub sdk_includes_tail: &'static [&'static str],
    /// Header force-included into every translation unit
    pub forced_include: &'static str,
    /// Toolchain quirks, applied to C and C++
    pub compile_flags: &'static [&'static str],
    /// C only
    pub c_flags: &'static [&'static str],
    pub link_flags: &'static [&'static str],
    /// Import libraries, relative to the SDK root
    pub sdk_lib_dirs: &'static [&'static str],
    pub libraries: LinkGroups,
}

impl PlatformProfile {
    /// The Symbian Belle GCCE profile
    pub fn symbian() -> &'static PlatformProfile {
        &SYMBIAN
    }

    /// Contribution of a build mode
    pub fn mode(&self, mode: BuildMode) -> &ModeContribution {
        match mode {
            BuildMode::Release => &self.release,
            BuildMode::ReleaseDebug => &self.release_debug,
            BuildMode::Debug => &self.debug,
        }
    }

    /// Contribution of an ABI variant
    pub fn abi(&self, variant: AbiVariant) -> &AbiContribution {
        match variant {
            AbiVariant::Legacy => &self.legacy,
            AbiVariant::Current => &self.current,
        }
    }

    /// Library directories inside the toolchain installation
    pub fn toolchain_lib_dirs(&self, toolchain_root: &str) -> [String; 2] {
        [
            join_path(
                toolchain_root,
                &format!("lib/gcc/{}/{}", self.triplet, self.gcc_version),
            ),
            join_path(toolchain_root, &format!("{}/lib", self.triplet)),
        ]
    }

    /// Check that the two ABI variants never contribute the same define
    pub fn abi_defines_disjoint(&self) -> bool {
        let legacy: HashSet<_> = abi_define_set(&self.legacy);
        abi_define_set(&self.current).is_disjoint(&legacy)
    }

    /// Verify the invariants the assembler relies on
    pub fn check(&self) -> Result<()> {
        if !self.abi_defines_disjoint() {
            return Err(Error::Profile(
                "legacy and current ABI defines overlap".to_string(),
            ));
        }

        if self.libraries.entry.is_empty() || self.libraries.toolchain_support.is_empty() {
            return Err(Error::Profile(
                "entry and toolchain support libraries are required".to_string(),
            ));
        }

        let modes = [self.release, self.release_debug, self.debug];
        for (i, a) in modes.iter().enumerate() {
            for b in &modes[i + 1..] {
                if a == b {
                    return Err(Error::Profile(
                        "build modes must contribute distinct bundles".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn abi_define_set(abi: &AbiContribution) -> HashSet<&'static str> {
    abi.defines
        .iter()
        .chain(abi.graphics_defines)
        .copied()
        .collect()
}

/// Join a root and a relative path with `/`
///
/// Output must not depend on the build host, so `std::path` is not used.
pub fn join_path(root: &str, relative: &str) -> String {
    let root = root.trim_end_matches(|c: char| c == '/' || c == '\\');
    if root.is_empty() {
        format!("/{}", relative)
    } else {
        format!("{}/{}", root, relative)
    }
}

static SYMBIAN: PlatformProfile = PlatformProfile {
    name: "Symbian",
    triplet: TargetTriplet::new("arm", "none", "symbianelf"),
    gcc_version: "12.1.0",

    release: ModeContribution {
        compile_flags: &["-Os", "-ffast-math", "-fomit-frame-pointer"],
        defines: &[],
    },
    release_debug: ModeContribution {
        compile_flags: &["-Os", "-ffast-math"],
        defines: &["DEBUG_ENABLED"],
    },
    debug: ModeContribution {
        compile_flags: &["-Os", "-g2", "-gdwarf-2"],
        defines: &[
            "DEBUG_ENABLED",
            "DEBUG_MEMORY_ENABLED",
            "DEBUG_SHADER",
            "DEBUG_OPENGL",
        ],
    },

    legacy: AbiContribution {
        defines: &[],
        graphics_defines: &["GLES1_ENABLED"],
        stl_include: "epoc32/include/stdapis/stlport",
        cxx_runtime: &[":libstdcpp.dso"],
        realtime_libs: &[],
        graphics_libs: &[],
    },
    current: AbiContribution {
        defines: &["__SERIES60_3X__", "SYMBIAN_S60V3_ENABLED"],
        graphics_defines: &["GLES2_ENABLED"],
        stl_include: "epoc32/include/stdapis/stlportv5",
        cxx_runtime: &[":stdnew.dso", ":libstdcppv5.dso"],
        realtime_libs: &[":librt.dso"],
        graphics_libs: &[":libGLESv2.dso", ":libegl.dso"],
    },

    defines: &[
        "UNIX_SOCKET_UNAVAILABLE",
        "NO_NETWORK",
        "NO_SYSLOG",
        "SYMBIAN_ENABLED",
        "UNIX_ENABLED",
        "NO_STATVFS",
        "NO_THREADS",
        "_POSIX_C_SOURCE=200112",
        "__ARM_ARCH_5__",
        "NDEBUG",
        "_UNICODE",
        "__SYMBIAN32__",
        "__SERIES60_31__",
        "__GCCE__",
        "__EPOC32__",
        "__MARM__",
        "__EABI__",
        "__MARM_ARMV5__",
        "__MARM_THUMB__",
        "__MARM_INTERWORK__",
        "__EXE__",
        "__SUPPORT_CPP_EXCEPTIONS__",
    ],
    product_include: "epoc32/include/variant/symbian_os.hrh",
    sdk_includes: &[
        "epoc32/include/platform/mw",
        "epoc32/include/platform",
        "epoc32/include/mw",
        "epoc32/include/stdapis",
    ],
    sdk_includes_tail: &["epoc32/include"],
    forced_include: "epoc32/include/gcce/gcce.h",
    compile_flags: &[
        "-fvisibility=hidden",
        "-fvisibility-inlines-hidden",
        "-fpermissive",
        "-Wno-error=narrowing",
        "-msoft-float",
        "-mthumb",
        "-mapcs",
        "-mthumb-interwork",
        "-march=armv5t",
        "-fno-optimize-sibling-calls",
        "-fno-unit-at-a-time",
        "-fno-threadsafe-statics",
        "-std=gnu++14",
    ],
    c_flags: &["-fno-common"],
    link_flags: &[
        "-fwhole-program",
        "-Wl,--default-symver",
        "-Wl,--fatal-warnings",
        "-Wl,--no-relax",
        "-Wl,--no-undefined",
        "-Wl,--target1-abs",
        "-Wl,--demangle",
        "-Wl,--pic-veneer",
        "-Ttext",
        "0x8000",
        "-Tdata",
        "0xe00000",
        "--entry",
        "_E32Startup",
        "-u",
        "_E32Startup",
        "-nostdlib",
        "-msoft-float",
        "-mthumb",
        "-mapcs",
        "-mthumb-interwork",
        "-fno-optimize-sibling-calls",
        "-march=armv5t",
    ],
    // udeb import libraries are used for every build mode
    sdk_lib_dirs: &["epoc32/release/armv5/lib", "epoc32/release/armv5/udeb"],
    libraries: LinkGroups {
        entry: &[":eexe.lib", ":usrt2_2.lib", ":libcrt0.lib"],
        posix: &[
            ":libc.dso",
            ":libm.dso",
            ":libpthread.dso",
            ":euser.dso",
            ":dfpaeabi.dso",
            ":dfprvct2_2.dso",
            ":drtaeabi.dso",
            ":scppnwdl.dso",
            ":drtrvct2_2.dso",
        ],
        framework: &[
            ":libdl.dso",
            ":bafl.dso",
            ":estor.dso",
            ":eikcore.dso",
            ":apparc.dso",
            ":avkon.dso",
            ":cone.dso",
            ":hal.dso",
            ":libGLES_CM.dso",
        ],
        utility: &[
            ":ws32.dso",
            ":gdi.dso",
            ":mediaclientaudiostream.dso",
            ":inetprotutil.dso",
            ":etext.dso",
            ":efsrv.dso",
        ],
        toolchain_support: &["supc++", "gcc"],
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbian_profile_is_consistent() {
        PlatformProfile::symbian().check().unwrap();
    }

    #[test]
    fn test_abi_defines_disjoint() {
        let profile = PlatformProfile::symbian();
        assert!(profile.abi_defines_disjoint());

        let mut overlapping = *profile;
        overlapping.legacy.defines = &["NO_THREADS"];
        overlapping.current.defines = &["NO_THREADS", "SYMBIAN_S60V3_ENABLED"];
        assert!(!overlapping.abi_defines_disjoint());
        assert!(matches!(overlapping.check(), Err(Error::Profile(_))));
    }

    #[test]
    fn test_triplet_display() {
        let triplet = PlatformProfile::symbian().triplet;
        assert_eq!(triplet.to_string(), "arm-none-symbianelf");
        assert_eq!(triplet.tool("g++"), "arm-none-symbianelf-g++");
    }

    #[test]
    fn test_toolchain_lib_dirs() {
        let dirs = PlatformProfile::symbian().toolchain_lib_dirs("/opt/gcc/");
        assert_eq!(dirs[0], "/opt/gcc/lib/gcc/arm-none-symbianelf/12.1.0");
        assert_eq!(dirs[1], "/opt/gcc/arm-none-symbianelf/lib");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/sdk", "epoc32/include"), "/sdk/epoc32/include");
        assert_eq!(join_path("C:\\SDK\\", "epoc32"), "C:\\SDK/epoc32");
        assert_eq!(join_path("/", "lib"), "/lib");
    }
}
