//! Harness configuration via `doccompat.toml`
//!
//! The file names the two systems to compare and tunes the runner. Every
//! field has a default, so an empty file is a valid config that runs only
//! the in-memory suites.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{HarnessError, Result};

/// Config file looked up in the working directory when `DOCCOMPAT_CONFIG`
/// is unset.
pub const CONFIG_FILE_NAME: &str = "doccompat.toml";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DOCCOMPAT_CONFIG";
/// Environment variable overriding `target_uri`.
pub const TARGET_URI_ENV: &str = "DOCCOMPAT_TARGET_URI";
/// Environment variable overriding `compat_uri`.
pub const COMPAT_URI_ENV: &str = "DOCCOMPAT_COMPAT_URI";

/// What a gated sub-test that observed no failure means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownFailurePolicy {
    /// Nothing; the gate stays silently green
    #[default]
    Tolerate,
    /// The sub-test fails with "expected failure did not occur"
    Strict,
}

/// Harness configuration loaded from `doccompat.toml`.
///
/// # Example
///
/// ```toml
/// target_uri = "mongodb://127.0.0.1:27017/"
/// compat_uri = "mongodb://127.0.0.1:37017/"
/// database = "compat"
/// timeout_ms = 30000
/// parallelism = 0
/// known_failures = "tolerate"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Connection string of the system under test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_uri: Option<String>,
    /// Connection string of the reference system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compat_uri: Option<String>,
    /// Database holding the generated collections.
    #[serde(default = "default_database")]
    pub database: String,
    /// Per-scenario timeout in milliseconds; 0 disables it.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum concurrently running scenarios; 0 means unbounded.
    #[serde(default)]
    pub parallelism: usize,
    /// Handling of gated sub-tests that pass.
    #[serde(default)]
    pub known_failures: KnownFailurePolicy,
}

fn default_database() -> String {
    "compat".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_uri: None,
            compat_uri: None,
            database: default_database(),
            timeout_ms: default_timeout_ms(),
            parallelism: 0,
            known_failures: KnownFailurePolicy::default(),
        }
    }
}

impl HarnessConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# doccompat configuration
#
# Connection strings of the two systems. Live suites are skipped unless
# both are set (here or via DOCCOMPAT_TARGET_URI / DOCCOMPAT_COMPAT_URI).
# target_uri = "mongodb://127.0.0.1:27017/"
# compat_uri = "mongodb://127.0.0.1:37017/"

# Database holding the generated <scenario>_<provider> collections
database = "compat"

# Per-scenario timeout in milliseconds (0 = none)
timeout_ms = 30000

# Maximum concurrently running scenarios (0 = unbounded)
parallelism = 0

# Gated sub-tests that pass: "tolerate" (default) or "strict"
known_failures = "tolerate"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: HarnessConfig = toml::from_str(&content).map_err(|e| {
            HarnessError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the process environment.
    ///
    /// The file named by `DOCCOMPAT_CONFIG` is read first, else
    /// `./doccompat.toml` if present, else defaults. Then
    /// `DOCCOMPAT_TARGET_URI` / `DOCCOMPAT_COMPAT_URI` override the
    /// connection strings.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(Path::new("."), |key| std::env::var(key).ok())
    }

    /// [`HarnessConfig::from_env`] over an arbitrary variable lookup, with
    /// `doccompat.toml` looked up in `dir`.
    pub fn from_lookup<F>(dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let local = dir.join(CONFIG_FILE_NAME);
        let mut config = match lookup(CONFIG_ENV).filter(|p| !p.is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if local.exists() => Self::from_file(&local)?,
            None => Self::default(),
        };
        if let Some(uri) = lookup(TARGET_URI_ENV).filter(|u| !u.is_empty()) {
            config.target_uri = Some(uri);
        }
        if let Some(uri) = lookup(COMPAT_URI_ENV).filter(|u| !u.is_empty()) {
            config.compat_uri = Some(uri);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank database name or a connection string
    /// that is not a `mongodb://` / `mongodb+srv://` URI.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(HarnessError::config("database must not be empty"));
        }
        for (field, uri) in [("target_uri", &self.target_uri), ("compat_uri", &self.compat_uri)] {
            if let Some(uri) = uri {
                if !(uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")) {
                    return Err(HarnessError::config(format!(
                        "Invalid {} '{}'. Expected a mongodb:// or mongodb+srv:// URI.",
                        field, uri
                    )));
                }
            }
        }
        Ok(())
    }

    /// True when both connection strings are set.
    pub fn live_configured(&self) -> bool {
        self.target_uri.is_some() && self.compat_uri.is_some()
    }

    /// Per-scenario timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                HarnessError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_offline() {
        let config = HarnessConfig::default();
        assert!(!config.live_configured());
        assert_eq!(config.database, "compat");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.known_failures, KnownFailurePolicy::Tolerate);
    }

    #[test]
    fn default_toml_parses_to_default() {
        let config: HarnessConfig = toml::from_str(HarnessConfig::default_toml()).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn empty_file_is_valid() {
        let config: HarnessConfig = toml::from_str("").unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn parse_strict_policy_and_zero_timeout() {
        let config: HarnessConfig =
            toml::from_str("known_failures = \"strict\"\ntimeout_ms = 0").unwrap();
        assert_eq!(config.known_failures, KnownFailurePolicy::Strict);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(toml::from_str::<HarnessConfig>("known_failures = \"maybe\"").is_err());
    }

    #[test]
    fn bad_uri_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "target_uri = \"http://localhost\"").unwrap();
        let err = HarnessConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("target_uri"));
    }

    #[test]
    fn missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let err = HarnessConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        HarnessConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        assert_eq!(HarnessConfig::from_file(&path).unwrap(), HarnessConfig::default());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "database = \"mine\"").unwrap();
        HarnessConfig::write_default_if_missing(&path).unwrap();
        assert_eq!(HarnessConfig::from_file(&path).unwrap().database, "mine");
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "target_uri = \"mongodb://file:1/\"\ndatabase = \"db\"").unwrap();

        let vars: HashMap<&str, String> = [
            (CONFIG_ENV, path.display().to_string()),
            (COMPAT_URI_ENV, "mongodb://env:2/".to_string()),
        ]
        .into_iter()
        .collect();
        let config = HarnessConfig::from_lookup(dir.path(), |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.target_uri.as_deref(), Some("mongodb://file:1/"));
        assert_eq!(config.compat_uri.as_deref(), Some("mongodb://env:2/"));
        assert_eq!(config.database, "db");
        assert!(config.live_configured());
    }

    #[test]
    fn empty_env_means_defaults() {
        let dir = TempDir::new().unwrap();
        let config = HarnessConfig::from_lookup(dir.path(), |_| None).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn local_file_is_used_without_env() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "target_uri = \"mongodb://local:1/\"\nparallelism = 2",
        )
        .unwrap();

        let config = HarnessConfig::from_lookup(dir.path(), |_| None).unwrap();
        assert_eq!(config.target_uri.as_deref(), Some("mongodb://local:1/"));
        assert_eq!(config.parallelism, 2);

        let vars: HashMap<&str, String> =
            [(TARGET_URI_ENV, "mongodb://env:1/".to_string())].into_iter().collect();
        let config = HarnessConfig::from_lookup(dir.path(), |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.target_uri.as_deref(), Some("mongodb://env:1/"));
        assert_eq!(config.parallelism, 2);
    }

    #[test]
    fn written_template_is_picked_up() {
        let dir = TempDir::new().unwrap();
        HarnessConfig::write_default_if_missing(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        let config = HarnessConfig::from_lookup(dir.path(), |_| None).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert!(!config.live_configured());
    }
}
