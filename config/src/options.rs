//! Typed option set
//!
//! Every configuration axis is an enum so that an [`OptionSet`] can only hold
//! values the resolver knows how to turn into flags. String input is mapped
//! onto these types by [`crate::normalize`].

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Build mode axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Size-optimized build without debug information
    Release,
    /// Size-optimized build with debug checks enabled
    ReleaseDebug,
    /// Full debug symbols and diagnostics
    Debug,
}

impl BuildMode {
    /// Accepted spellings, in declaration order
    pub const NAMES: &'static [&'static str] = &["release", "release_debug", "debug"];

    /// Get all build modes
    pub fn all() -> [BuildMode; 3] {
        [BuildMode::Release, BuildMode::ReleaseDebug, BuildMode::Debug]
    }

    /// Get the option value naming this mode
    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Release => "release",
            BuildMode::ReleaseDebug => "release_debug",
            BuildMode::Debug => "debug",
        }
    }

    /// Parse an option value
    pub fn parse(s: &str) -> Option<BuildMode> {
        match s {
            "release" => Some(BuildMode::Release),
            "release_debug" => Some(BuildMode::ReleaseDebug),
            "debug" => Some(BuildMode::Debug),
            _ => None,
        }
    }

    /// Whether debug checks are compiled in
    pub fn is_debug(&self) -> bool {
        !matches!(self, BuildMode::Release)
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// OS ABI variant axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiVariant {
    /// Pre-S^3 ABI: GLES1 only, old STL port
    Legacy,
    /// S60 3rd edition and later: GLES2, EGL, librt
    Current,
}

impl AbiVariant {
    /// Accepted spellings, in declaration order
    pub const NAMES: &'static [&'static str] = &["legacy", "current"];

    /// Get both variants
    pub fn all() -> [AbiVariant; 2] {
        [AbiVariant::Legacy, AbiVariant::Current]
    }

    /// Get the option value naming this variant
    pub fn name(&self) -> &'static str {
        match self {
            AbiVariant::Legacy => "legacy",
            AbiVariant::Current => "current",
        }
    }

    /// Parse an option value
    pub fn parse(s: &str) -> Option<AbiVariant> {
        match s {
            "legacy" => Some(AbiVariant::Legacy),
            "current" => Some(AbiVariant::Current),
            _ => None,
        }
    }
}

impl std::fmt::Display for AbiVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Target word size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordSize {
    #[serde(rename = "32")]
    Bits32,
    #[serde(rename = "64")]
    Bits64,
}

impl WordSize {
    pub const NAMES: &'static [&'static str] = &["32", "64"];

    pub fn name(&self) -> &'static str {
        match self {
            WordSize::Bits32 => "32",
            WordSize::Bits64 => "64",
        }
    }

    pub fn parse(s: &str) -> Option<WordSize> {
        match s {
            "32" => Some(WordSize::Bits32),
            "64" => Some(WordSize::Bits64),
            _ => None,
        }
    }
}

impl std::fmt::Display for WordSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a third-party library comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibrarySource {
    /// Copy bundled with the application sources
    #[default]
    Bundled,
    /// Copy provided by the build environment
    System,
}

impl LibrarySource {
    /// Map a `use_system_*` toggle onto a source
    pub fn from_use_system(use_system: bool) -> Self {
        if use_system {
            LibrarySource::System
        } else {
            LibrarySource::Bundled
        }
    }
}

/// Optional third-party libraries that can be taken from the system
///
/// Declaration order matters: discovery steps are emitted in this order,
/// and the media libraries come after everything they force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemLibrary {
    Openssl,
    Libwebp,
    Freetype2,
    Libpng,
    Theora,
    Vorbis,
    Opus,
    Ogg,
}

impl SystemLibrary {
    /// Number of libraries
    pub const COUNT: usize = 8;

    /// All libraries in declaration order
    pub const ALL: [SystemLibrary; SystemLibrary::COUNT] = [
        SystemLibrary::Openssl,
        SystemLibrary::Libwebp,
        SystemLibrary::Freetype2,
        SystemLibrary::Libpng,
        SystemLibrary::Theora,
        SystemLibrary::Vorbis,
        SystemLibrary::Opus,
        SystemLibrary::Ogg,
    ];

    /// Position in [`SystemLibrary::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short library name
    pub fn name(&self) -> &'static str {
        match self {
            SystemLibrary::Openssl => "openssl",
            SystemLibrary::Libwebp => "libwebp",
            SystemLibrary::Freetype2 => "freetype2",
            SystemLibrary::Libpng => "libpng",
            SystemLibrary::Theora => "theora",
            SystemLibrary::Vorbis => "vorbis",
            SystemLibrary::Opus => "opus",
            SystemLibrary::Ogg => "ogg",
        }
    }

    /// Name of the toggle selecting the system copy
    pub fn option_name(&self) -> &'static str {
        match self {
            SystemLibrary::Openssl => "use_system_openssl",
            SystemLibrary::Libwebp => "use_system_libwebp",
            SystemLibrary::Freetype2 => "use_system_freetype2",
            SystemLibrary::Libpng => "use_system_libpng",
            SystemLibrary::Theora => "use_system_theora",
            SystemLibrary::Vorbis => "use_system_vorbis",
            SystemLibrary::Opus => "use_system_opus",
            SystemLibrary::Ogg => "use_system_ogg",
        }
    }

    /// pkg-config packages queried when the system copy is used
    pub fn pkg_config_packages(&self) -> &'static [&'static str] {
        match self {
            SystemLibrary::Openssl => &["openssl"],
            SystemLibrary::Libwebp => &["libwebp"],
            SystemLibrary::Freetype2 => &["freetype2"],
            SystemLibrary::Libpng => &["libpng"],
            SystemLibrary::Theora => &["theora", "theoradec"],
            SystemLibrary::Vorbis => &["vorbis", "vorbisfile"],
            SystemLibrary::Opus => &["opus", "opusfile"],
            SystemLibrary::Ogg => &["ogg"],
        }
    }

    /// Look a library up by its toggle name
    pub fn from_option_name(name: &str) -> Option<SystemLibrary> {
        SystemLibrary::ALL
            .into_iter()
            .find(|lib| lib.option_name() == name)
    }
}

impl std::fmt::Display for SystemLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Source selection for every [`SystemLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LibrarySources([LibrarySource; SystemLibrary::COUNT]);

impl LibrarySources {
    /// All libraries bundled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, lib: SystemLibrary) -> LibrarySource {
        self.0[lib.index()]
    }

    pub fn set(&mut self, lib: SystemLibrary, source: LibrarySource) {
        self.0[lib.index()] = source;
    }

    /// Check if the system copy of a library is requested
    pub fn is_system(&self, lib: SystemLibrary) -> bool {
        self.get(lib) == LibrarySource::System
    }

    /// Iterate over all libraries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (SystemLibrary, LibrarySource)> + '_ {
        SystemLibrary::ALL.into_iter().map(|lib| (lib, self.get(lib)))
    }

    /// Libraries taken from the system, in declaration order
    pub fn system(&self) -> impl Iterator<Item = SystemLibrary> + '_ {
        self.iter()
            .filter(|(_, source)| *source == LibrarySource::System)
            .map(|(lib, _)| lib)
    }
}

impl Serialize for LibrarySources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SystemLibrary::COUNT))?;
        for (lib, source) in self.iter() {
            map.serialize_entry(lib.name(), &source)?;
        }
        map.end()
    }
}

/// Normalized options for one resolution
///
/// Produced by [`crate::normalize`]; every field is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSet {
    pub build_mode: BuildMode,
    pub abi_variant: AbiVariant,
    pub word_size: WordSize,
    pub force_32_bits: bool,
    pub libraries: LibrarySources,
    /// Symbian SDK root (EPOCROOT)
    pub sdk_root: String,
    /// Companion project root, searched before the SDK headers
    pub companion_root: String,
    /// C++ compiler path
    pub cxx: String,
    /// Linker map output path
    pub map_file: String,
}

impl OptionSet {
    /// Toolchain installation root, two levels above the compiler binary
    ///
    /// Returns `None` for a bare compiler name, since no library directories
    /// can be derived from it.
    pub fn toolchain_root(&self) -> Option<&str> {
        let is_sep = |c: char| c == '/' || c == '\\';
        let bin_dir = &self.cxx[..self.cxx.rfind(is_sep)?];
        let root = &bin_dir[..bin_dir.rfind(is_sep)?];
        if root.is_empty() {
            // Compiler lives in /bin
            return Some("/");
        }
        Some(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_with_cxx(cxx: &str) -> OptionSet {
        OptionSet {
            build_mode: BuildMode::Release,
            abi_variant: AbiVariant::Current,
            word_size: WordSize::Bits32,
            force_32_bits: true,
            libraries: LibrarySources::new(),
            sdk_root: "/sdk".to_string(),
            companion_root: "/proj".to_string(),
            cxx: cxx.to_string(),
            map_file: "bin/app.exe.map".to_string(),
        }
    }

    #[test]
    fn test_build_mode_names_roundtrip() {
        for mode in BuildMode::all() {
            assert_eq!(BuildMode::parse(mode.name()), Some(mode));
        }
        assert_eq!(BuildMode::parse("turbo"), None);
    }

    #[test]
    fn test_system_library_indices_match_declaration() {
        for (i, lib) in SystemLibrary::ALL.iter().enumerate() {
            assert_eq!(lib.index(), i);
        }
        assert_eq!(
            SystemLibrary::from_option_name("use_system_ogg"),
            Some(SystemLibrary::Ogg)
        );
        assert_eq!(SystemLibrary::from_option_name("use_system_zlib"), None);
    }

    #[test]
    fn test_library_sources() {
        let mut sources = LibrarySources::new();
        assert_eq!(sources.system().count(), 0);

        sources.set(SystemLibrary::Opus, LibrarySource::System);
        sources.set(SystemLibrary::Libpng, LibrarySource::System);

        let system: Vec<_> = sources.system().collect();
        assert_eq!(system, vec![SystemLibrary::Libpng, SystemLibrary::Opus]);
        assert!(!sources.is_system(SystemLibrary::Ogg));
    }

    #[test]
    fn test_toolchain_root() {
        assert_eq!(
            options_with_cxx("/opt/gcc12/bin/arm-none-symbianelf-g++").toolchain_root(),
            Some("/opt/gcc12")
        );
        assert_eq!(
            options_with_cxx("C:\\gcc\\bin\\arm-none-symbianelf-g++.exe").toolchain_root(),
            Some("C:\\gcc")
        );
        assert_eq!(options_with_cxx("/bin/g++").toolchain_root(), Some("/"));
        assert_eq!(options_with_cxx("bin/g++").toolchain_root(), None);
        assert_eq!(
            options_with_cxx("arm-none-symbianelf-g++").toolchain_root(),
            None
        );
    }
}
