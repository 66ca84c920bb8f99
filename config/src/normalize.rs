//! Option normalization
//!
//! Turns a raw, string-keyed option bag into a typed [`OptionSet`]:
//! - unknown keys are rejected
//! - omitted options and `default`/`auto` sentinels take the declared default
//! - every value is checked against its declared domain
//!
//! Keyword values (enum choices, booleans and sentinels) match in any case.
//! Paths are taken as written.

use crate::declare::{self, OptionKind};
use crate::options::{
    AbiVariant, BuildMode, LibrarySource, LibrarySources, OptionSet, SystemLibrary, WordSize,
};
use crate::{ConfigError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A raw option value as read from a file or the environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl RawValue {
    /// Textual form used for validation and error messages
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Bool(true) => Cow::Borrowed("true"),
            RawValue::Bool(false) => Cow::Borrowed("false"),
            RawValue::Integer(n) => Cow::Owned(n.to_string()),
            RawValue::Text(s) => Cow::Borrowed(s.trim()),
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// Raw options keyed by option name, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOptions {
    values: IndexMap<String, RawValue>,
}

impl RawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        self.values.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge another set on top of this one
    pub fn merge(&mut self, other: &RawOptions) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }
}

/// Normalize raw options into a complete [`OptionSet`]
pub fn normalize(raw: &RawOptions) -> Result<OptionSet> {
    if let Some((name, _)) = raw.iter().find(|(name, _)| declare::find(name).is_none()) {
        return Err(ConfigError::UnknownOption(name.to_string()));
    }

    let build_mode = match value_of(raw, "build_mode") {
        Some(text) => {
            BuildMode::parse(&text.to_ascii_lowercase())
                .ok_or(ConfigError::UnknownBuildMode(Some(text.into_owned())))?
        }
        None => return Err(ConfigError::UnknownBuildMode(None)),
    };

    let abi_variant = parse_choice(raw, "abi_variant", AbiVariant::parse)?;
    let force_32_bits = parse_bool(raw, "force_32_bits")?;
    let mut word_size = parse_choice(raw, "bits", WordSize::parse)?;
    if force_32_bits && word_size != WordSize::Bits32 {
        tracing::warn!(
            "force_32_bits is set, building {}-bit instead of {}-bit",
            WordSize::Bits32,
            word_size
        );
        word_size = WordSize::Bits32;
    }

    let mut libraries = LibrarySources::new();
    for lib in SystemLibrary::ALL {
        let use_system = parse_bool(raw, lib.option_name())?;
        libraries.set(lib, LibrarySource::from_use_system(use_system));
    }

    let options = OptionSet {
        build_mode,
        abi_variant,
        word_size,
        force_32_bits,
        libraries,
        sdk_root: parse_path(raw, "sdk_root")?,
        companion_root: parse_path(raw, "companion_root")?,
        cxx: parse_path(raw, "cxx")?,
        map_file: parse_path(raw, "map_file")?,
    };

    tracing::debug!(
        build_mode = %options.build_mode,
        abi_variant = %options.abi_variant,
        word_size = %options.word_size,
        "normalized options"
    );

    Ok(options)
}

/// Value after default substitution, `None` when the option has no default
fn value_of<'a>(raw: &'a RawOptions, name: &str) -> Option<Cow<'a, str>> {
    let supplied = raw
        .get(name)
        .map(RawValue::as_text)
        .filter(|text| !declare::is_default_sentinel(text));

    supplied.or_else(|| declare::find(name)?.default.map(Cow::Borrowed))
}

fn required(raw: &RawOptions, name: &str) -> Result<String> {
    value_of(raw, name)
        .map(Cow::into_owned)
        .ok_or_else(|| ConfigError::MissingOption(name.to_string()))
}

fn parse_choice<T>(raw: &RawOptions, name: &str, parse: fn(&str) -> Option<T>) -> Result<T> {
    let text = required(raw, name)?;
    parse(&text.to_ascii_lowercase()).ok_or_else(|| {
        let allowed = declare::find(name)
            .map(|decl| decl.kind.allowed())
            .unwrap_or_default();
        ConfigError::invalid_value(name, &text, allowed)
    })
}

fn parse_bool(raw: &RawOptions, name: &str) -> Result<bool> {
    let text = required(raw, name)?;
    match text.to_ascii_lowercase().as_str() {
        "yes" | "true" => Ok(true),
        "no" | "false" => Ok(false),
        _ => Err(ConfigError::invalid_value(
            name,
            &text,
            OptionKind::Bool.allowed(),
        )),
    }
}

fn parse_path(raw: &RawOptions, name: &str) -> Result<String> {
    if let Some(RawValue::Bool(_)) = raw.get(name) {
        let got = raw.get(name).map(RawValue::as_text).unwrap_or_default();
        return Err(ConfigError::invalid_value(
            name,
            &got,
            OptionKind::Path.allowed(),
        ));
    }

    let path = required(raw, name)?;
    if path.is_empty() {
        return Err(ConfigError::InvalidPath {
            name: name.to_string(),
            reason: "path is empty".to_string(),
        });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn release() -> RawOptions {
        RawOptions::new().with("build_mode", "release")
    }

    #[test]
    fn test_defaults_applied() {
        let options = normalize(&release()).unwrap();
        assert_eq!(options.build_mode, BuildMode::Release);
        assert_eq!(options.abi_variant, AbiVariant::Current);
        assert_eq!(options.word_size, WordSize::Bits32);
        assert!(options.force_32_bits);
        assert_eq!(options.libraries.system().count(), 0);
        assert_eq!(
            options.sdk_root,
            "C:/Nokia/devices/Nokia_Symbian_Belle_SDK_v1.0"
        );
        assert_eq!(options.companion_root, "C:/Projects/sympathy");
    }

    #[test]
    fn test_sentinels_select_default() {
        let raw = release()
            .with("abi_variant", "default")
            .with("bits", "auto")
            .with("use_system_ogg", "default");
        let options = normalize(&raw).unwrap();
        assert_eq!(options.abi_variant, AbiVariant::Current);
        assert_eq!(options.word_size, WordSize::Bits32);
        assert!(!options.libraries.is_system(SystemLibrary::Ogg));
    }

    #[test]
    fn test_bool_spellings() {
        let raw = release()
            .with("use_system_openssl", "yes")
            .with("use_system_libpng", true)
            .with("use_system_opus", "TRUE")
            .with("use_system_ogg", "no");
        let options = normalize(&raw).unwrap();
        assert!(options.libraries.is_system(SystemLibrary::Openssl));
        assert!(options.libraries.is_system(SystemLibrary::Libpng));
        assert!(options.libraries.is_system(SystemLibrary::Opus));
        assert!(!options.libraries.is_system(SystemLibrary::Ogg));
    }

    #[test]
    fn test_invalid_enum_value() {
        let err = normalize(&release().with("abi_variant", "s40")).unwrap_err();
        assert_matches!(
            err,
            ConfigError::InvalidOptionValue { ref name, ref got, ref allowed }
                if name == "abi_variant" && got == "s40" && allowed == &["legacy", "current"]
        );
    }

    #[test]
    fn test_keywords_match_any_case() {
        let raw = RawOptions::new()
            .with("build_mode", "Release_Debug")
            .with("abi_variant", "LEGACY")
            .with("bits", "Default")
            .with("use_system_ogg", "Yes")
            .with("sdk_root", "/Opt/EPOC");
        let options = normalize(&raw).unwrap();
        assert_eq!(options.build_mode, BuildMode::ReleaseDebug);
        assert_eq!(options.abi_variant, AbiVariant::Legacy);
        assert_eq!(options.word_size, WordSize::Bits32);
        assert!(options.libraries.is_system(SystemLibrary::Ogg));
        assert_eq!(options.sdk_root, "/Opt/EPOC");

        let err = normalize(&RawOptions::new().with("build_mode", "Turbo")).unwrap_err();
        assert_matches!(err, ConfigError::UnknownBuildMode(Some(ref v)) if v == "Turbo");
    }

    #[test]
    fn test_invalid_bool_value() {
        let err = normalize(&release().with("use_system_theora", "maybe")).unwrap_err();
        assert_matches!(err, ConfigError::InvalidOptionValue { ref name, .. } if name == "use_system_theora");
    }

    #[test]
    fn test_unknown_build_mode() {
        let err = normalize(&RawOptions::new().with("build_mode", "turbo")).unwrap_err();
        assert_matches!(err, ConfigError::UnknownBuildMode(Some(ref v)) if v == "turbo");

        let err = normalize(&RawOptions::new()).unwrap_err();
        assert_matches!(err, ConfigError::UnknownBuildMode(None));

        let err = normalize(&RawOptions::new().with("build_mode", "default")).unwrap_err();
        assert_matches!(err, ConfigError::UnknownBuildMode(None));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = normalize(&release().with("use_system_zlib", "yes")).unwrap_err();
        assert_matches!(err, ConfigError::UnknownOption(ref name) if name == "use_system_zlib");
    }

    #[test]
    fn test_force_32_bits_overrides_word_size() {
        let options = normalize(&release().with("bits", RawValue::Integer(64))).unwrap();
        assert_eq!(options.word_size, WordSize::Bits32);

        let options = normalize(&release().with("bits", "64").with("force_32_bits", "no")).unwrap();
        assert_eq!(options.word_size, WordSize::Bits64);
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = normalize(&release().with("sdk_root", "  ")).unwrap_err();
        assert_matches!(err, ConfigError::InvalidPath { ref name, .. } if name == "sdk_root");

        let err = normalize(&release().with("companion_root", true)).unwrap_err();
        assert_matches!(err, ConfigError::InvalidOptionValue { ref name, .. } if name == "companion_root");
    }

    #[test]
    fn test_normalize_is_pure() {
        let raw = release().with("use_system_vorbis", "yes");
        let before = raw.clone();
        let a = normalize(&raw).unwrap();
        let b = normalize(&raw).unwrap();
        assert_eq!(a, b);
        assert_eq!(raw, before);
    }
}
