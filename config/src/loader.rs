//! Configuration loading utilities
//!
//! Reads raw options from a flat TOML file and layers environment overrides
//! on top. The result is still raw; [`crate::normalize`] does the checking.

use crate::declare::OPTIONS;
use crate::{ConfigError, RawOptions, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Loader for option files
pub struct ConfigLoader {
    /// Option file path
    path: PathBuf,
    /// Whether a missing file yields an empty option set
    use_defaults: bool,
    /// Whether `SYMCONF_*` variables override file values
    env_overrides: bool,
    /// Whether to sanity-check paths after loading
    validate: bool,
}

impl ConfigLoader {
    /// Create a new loader for an option file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            use_defaults: true,
            env_overrides: true,
            validate: true,
        }
    }

    /// Create a loader for the file named by `SYMCONF_CONFIG`, or the default
    pub fn from_env() -> Self {
        Self::new(get_config_path())
    }

    /// Set whether a missing file is acceptable
    pub fn use_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }

    /// Set whether environment variables override file values
    pub fn env_overrides(mut self, env_overrides: bool) -> Self {
        self.env_overrides = env_overrides;
        self
    }

    /// Set whether to validate after loading
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Get the option file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load raw options
    pub fn load(&self) -> Result<RawOptions> {
        let mut raw = if self.path.exists() {
            tracing::debug!("loading options from {}", self.path.display());
            parse_options(&std::fs::read_to_string(&self.path)?)?
        } else if self.use_defaults {
            tracing::debug!(
                "{} not found, using declared defaults",
                self.path.display()
            );
            RawOptions::new()
        } else {
            return Err(ConfigError::NotFound(self.path.clone()));
        };

        if self.env_overrides {
            apply_env_overrides(&mut raw, std::env::vars_os())?;
        }

        if self.validate {
            validate_raw(&raw);
        }

        Ok(raw)
    }
}

/// Parse the contents of an option file
pub fn parse_options(contents: &str) -> Result<RawOptions> {
    Ok(toml::from_str(contents)?)
}

/// Apply `SYMCONF_<OPTION>` overrides from a set of variables
///
/// Only declared options are looked up, so unrelated `SYMCONF_*` variables
/// such as `SYMCONF_CONFIG` are ignored, as are variables whose names are
/// not UTF-8. A declared option whose value is not UTF-8 is an error.
pub fn apply_env_overrides<I, K, V>(raw: &mut RawOptions, vars: I) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let vars: HashMap<String, OsString> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.into().into_string().ok()?;
            key.starts_with(env_vars::OPTION_PREFIX)
                .then(|| (key, value.into()))
        })
        .collect();

    for decl in OPTIONS {
        let var = env_vars::option_var(decl.name);
        if let Some(value) = vars.get(&var) {
            let value = value
                .to_str()
                .ok_or_else(|| ConfigError::NonUnicodeEnv(var.clone()))?;
            tracing::debug!("{} overridden from environment", decl.name);
            raw.insert(decl.name, value);
        }
    }

    Ok(())
}

/// Warn about settings that are legal but look wrong on this host
fn validate_raw(raw: &RawOptions) {
    for name in ["sdk_root", "companion_root"] {
        if let Some(value) = raw.get(name) {
            let path = PathBuf::from(value.as_text().into_owned());
            if !path.exists() {
                tracing::warn!("{} does not exist: {}", name, path.display());
            }
        }
    }
}

/// Default configuration paths
pub mod paths {
    use std::path::PathBuf;

    /// Option file in the working directory
    pub fn default_config() -> PathBuf {
        PathBuf::from("symconf.toml")
    }
}

/// Environment variable names used by the configuration system
pub mod env_vars {
    /// Option file override
    pub const CONFIG: &str = "SYMCONF_CONFIG";
    /// Prefix of per-option overrides
    pub const OPTION_PREFIX: &str = "SYMCONF_";

    /// Variable overriding an option
    pub fn option_var(name: &str) -> String {
        format!("{}{}", OPTION_PREFIX, name.to_uppercase())
    }
}

/// Get option file path from environment or default
pub fn get_config_path() -> PathBuf {
    std::env::var(env_vars::CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|_| paths::default_config())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawValue;

    #[test]
    fn test_loader_missing_file_defaults() {
        let loader = ConfigLoader::new("/nonexistent/symconf.toml").env_overrides(false);
        let raw = loader.load().unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn test_loader_missing_file_no_defaults() {
        let loader = ConfigLoader::new("/nonexistent/symconf.toml").use_defaults(false);
        assert!(matches!(loader.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_parse_options() {
        let raw = parse_options(
            r#"
            build_mode = "debug"
            bits = 32
            use_system_ogg = true
            sdk_root = "/sdk"
            "#,
        )
        .unwrap();

        assert_eq!(raw.get("build_mode"), Some(&RawValue::from("debug")));
        assert_eq!(raw.get("bits"), Some(&RawValue::Integer(32)));
        assert_eq!(raw.get("use_system_ogg"), Some(&RawValue::Bool(true)));
        let names: Vec<_> = raw.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["build_mode", "bits", "use_system_ogg", "sdk_root"]);
    }

    #[test]
    fn test_parse_options_rejects_tables() {
        let err = parse_options("[section]\nbuild_mode = \"debug\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut raw = RawOptions::new().with("build_mode", "release");
        let vars = vec![
            ("SYMCONF_BUILD_MODE".to_string(), "debug".to_string()),
            ("SYMCONF_USE_SYSTEM_OPUS".to_string(), "yes".to_string()),
            ("SYMCONF_CONFIG".to_string(), "/etc/symconf.toml".to_string()),
            ("BUILD_MODE".to_string(), "release_debug".to_string()),
        ];

        apply_env_overrides(&mut raw, vars).unwrap();

        assert_eq!(raw.get("build_mode"), Some(&RawValue::from("debug")));
        assert_eq!(raw.get("use_system_opus"), Some(&RawValue::from("yes")));
        assert_eq!(raw.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_env_overrides_skip_unrelated_non_unicode() {
        use std::os::unix::ffi::OsStringExt;

        let mut raw = RawOptions::new();
        let vars = vec![
            (
                OsString::from("UNRELATED_BYTES"),
                OsString::from_vec(vec![0xff, 0xfe]),
            ),
            (
                OsString::from_vec(vec![b'S', 0xff]),
                OsString::from("yes"),
            ),
            (
                OsString::from("SYMCONF_ABI_VARIANT"),
                OsString::from("legacy"),
            ),
        ];

        apply_env_overrides(&mut raw, vars).unwrap();

        assert_eq!(raw.get("abi_variant"), Some(&RawValue::from("legacy")));
        assert_eq!(raw.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_env_overrides_non_unicode_option_value() {
        use std::os::unix::ffi::OsStringExt;

        let mut raw = RawOptions::new();
        let vars = vec![(
            OsString::from("SYMCONF_SDK_ROOT"),
            OsString::from_vec(vec![b'/', 0xff]),
        )];

        let err = apply_env_overrides(&mut raw, vars).unwrap_err();
        assert!(matches!(err, ConfigError::NonUnicodeEnv(ref var) if var == "SYMCONF_SDK_ROOT"));
        assert!(raw.is_empty());
    }

    #[test]
    fn test_option_var() {
        assert_eq!(env_vars::option_var("sdk_root"), "SYMCONF_SDK_ROOT");
    }
}
