//! Configuration resolution for Uptime.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Config file (JSON, passed with `--config`)
//! 3. Environment variables
//! 4. CLI arguments (highest priority, applied by the binary)
//!
//! The resolved [`Config`] is handed to each component's constructor;
//! nothing reads configuration from ambient state after start-up.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Uptime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub checks: CheckConfig,
    #[serde(default)]
    pub logs: LogConfig,
}

/// Entity store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".data"),
        }
    }
}

/// Password hashing and token lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Server-side HMAC key for password hashes.
    pub hashing_secret: String,
    /// Lifetime of an issued or extended token (seconds).
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            hashing_secret: "change-me".to_string(),
            token_ttl_secs: 60 * 60, // 1 hour
        }
    }
}

/// Per-user check limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub max_checks_per_user: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_checks_per_user: 5,
        }
    }
}

/// Log archive location and rotation cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: PathBuf,
    /// Interval between rotation passes in `rotate --watch` mode (seconds).
    pub rotation_interval_secs: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".logs"),
            rotation_interval_secs: 24 * 60 * 60, // daily
        }
    }
}

impl Config {
    /// Reject values no component can operate with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.hashing_secret.is_empty() {
            return Err(Error::Config("auth.hashing_secret must not be empty".into()));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(Error::Config("auth.token_ttl_secs must be positive".into()));
        }
        if self.checks.max_checks_per_user == 0 {
            return Err(Error::Config(
                "checks.max_checks_per_user must be positive".into(),
            ));
        }
        if self.logs.rotation_interval_secs == 0 {
            return Err(Error::Config(
                "logs.rotation_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
///
/// A missing `path` means "defaults plus environment".
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Apply `UPTIME_*` overrides read through `lookup`.
///
/// Unparseable numeric values are ignored and the previous value kept.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("UPTIME_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(val);
    }
    if let Some(val) = lookup("UPTIME_HASHING_SECRET") {
        config.auth.hashing_secret = val;
    }
    if let Some(n) = lookup("UPTIME_TOKEN_TTL_SECS").and_then(|v| v.parse().ok()) {
        config.auth.token_ttl_secs = n;
    }
    if let Some(n) = lookup("UPTIME_MAX_CHECKS").and_then(|v| v.parse().ok()) {
        config.checks.max_checks_per_user = n;
    }
    if let Some(val) = lookup("UPTIME_LOG_DIR") {
        config.logs.dir = PathBuf::from(val);
    }
    if let Some(n) = lookup("UPTIME_ROTATION_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.logs.rotation_interval_secs = n;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.checks.max_checks_per_user, 5);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.logs.dir, PathBuf::from(".logs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uptime.json");
        std::fs::write(&path, r#"{ "checks": { "max_checks_per_user": 3 } }"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.checks.max_checks_per_user, 3);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.storage.data_dir, PathBuf::from(".data"));
    }

    #[test]
    fn unparseable_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uptime.json");
        std::fs::write(&path, "{ nope").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_config(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("UPTIME_HASHING_SECRET", "s3cret"),
            ("UPTIME_MAX_CHECKS", "not-a-number"),
            ("UPTIME_TOKEN_TTL_SECS", "60"),
            ("UPTIME_LOG_DIR", "/var/log/uptime"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(ToString::to_string));

        assert_eq!(config.auth.hashing_secret, "s3cret");
        assert_eq!(config.auth.token_ttl_secs, 60);
        assert_eq!(config.checks.max_checks_per_user, 5);
        assert_eq!(config.logs.dir, PathBuf::from("/var/log/uptime"));
    }

    #[test]
    fn validate_rejects_empty_secret_and_zero_cap() {
        let mut config = Config::default();
        config.auth.hashing_secret.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.checks.max_checks_per_user = 0;
        assert!(config.validate().is_err());
    }
}
