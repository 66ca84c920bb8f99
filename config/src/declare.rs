//! Declared options
//!
//! The fixed table of options the resolver understands, with their value
//! domains and defaults. Nothing outside this table is accepted.
//! Enum choices, booleans and the default sentinels match in any case.

use crate::options::{AbiVariant, BuildMode, WordSize};
use serde::Serialize;

/// Values that request the declared default
pub const DEFAULT_SENTINELS: &[&str] = &["default", "auto"];

/// Accepted boolean spellings
pub const BOOL_VALUES: &[&str] = &["yes", "no", "true", "false"];

/// Value domain of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum OptionKind {
    Bool,
    Enum(&'static [&'static str]),
    Path,
}

impl OptionKind {
    /// Legal values for error reporting
    pub fn allowed(&self) -> &'static [&'static str] {
        match *self {
            OptionKind::Bool => BOOL_VALUES,
            OptionKind::Enum(values) => values,
            OptionKind::Path => &["<path>"],
        }
    }
}

/// One declared option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionDecl {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: OptionKind,
    /// `None` means the option must be supplied
    pub default: Option<&'static str>,
}

const fn decl(
    name: &'static str,
    help: &'static str,
    kind: OptionKind,
    default: Option<&'static str>,
) -> OptionDecl {
    OptionDecl {
        name,
        help,
        kind,
        default,
    }
}

/// All declared options
pub const OPTIONS: &[OptionDecl] = &[
    decl(
        "build_mode",
        "Build mode (release, release_debug, debug)",
        OptionKind::Enum(BuildMode::NAMES),
        None,
    ),
    decl(
        "abi_variant",
        "OS ABI variant (legacy, current)",
        OptionKind::Enum(AbiVariant::NAMES),
        Some("current"),
    ),
    decl(
        "bits",
        "Target word size",
        OptionKind::Enum(WordSize::NAMES),
        Some("32"),
    ),
    decl(
        "force_32_bits",
        "Force 32 bits binary",
        OptionKind::Bool,
        Some("yes"),
    ),
    decl(
        "sdk_root",
        "EPOC root",
        OptionKind::Path,
        Some("C:/Nokia/devices/Nokia_Symbian_Belle_SDK_v1.0"),
    ),
    decl(
        "companion_root",
        "Project Sympathy root",
        OptionKind::Path,
        Some("C:/Projects/sympathy"),
    ),
    decl(
        "cxx",
        "C++ compiler, used to locate the toolchain libraries",
        OptionKind::Path,
        Some("arm-none-symbianelf-g++"),
    ),
    decl(
        "map_file",
        "Linker map output",
        OptionKind::Path,
        Some("bin/app.exe.map"),
    ),
    decl(
        "use_system_openssl",
        "Use the system OpenSSL library",
        OptionKind::Bool,
        Some("no"),
    ),
    decl(
        "use_system_libwebp",
        "Use the system libwebp library",
        OptionKind::Bool,
        Some("no"),
    ),
    decl(
        "use_system_freetype2",
        "Use the system FreeType library",
        OptionKind::Bool,
        Some("no"),
    ),
    decl(
        "use_system_libpng",
        "Use the system libpng library",
        OptionKind::Bool,
        Some("no"),
    ),
    decl(
        "use_system_theora",
        "Use the system libtheora library",
        OptionKind::Bool,
        Some("no"),
    ),
    decl(
        "use_system_vorbis",
        "Use the system libvorbis library",
        OptionKind::Bool,
        Some("no"),
    ),
    decl(
        "use_system_opus",
        "Use the system Opus library",
        OptionKind::Bool,
        Some("no"),
    ),
    decl(
        "use_system_ogg",
        "Use the system libogg library",
        OptionKind::Bool,
        Some("no"),
    ),
];

/// Find the declaration of an option
pub fn find(name: &str) -> Option<&'static OptionDecl> {
    OPTIONS.iter().find(|decl| decl.name == name)
}

/// Check if a value requests the declared default
pub fn is_default_sentinel(value: &str) -> bool {
    DEFAULT_SENTINELS
        .iter()
        .any(|sentinel| sentinel.eq_ignore_ascii_case(value))
}
