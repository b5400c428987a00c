//! # Configuration State
//!
//! Desk configuration loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line `--db` (database path only)
//! 2. Environment variables (`LIBRIS_*`)
//! 3. Defaults (this file)
//!
//! ## Environment Variables
//! | Variable                       | Default                         |
//! |--------------------------------|---------------------------------|
//! | `LIBRIS_DB_PATH`               | `<data dir>/libris.db`          |
//! | `LIBRIS_LOAN_DAYS`             | `14`                            |
//! | `LIBRIS_FINE_PER_DAY`          | `0.50` (at most `1000.00`)      |
//! | `LIBRIS_REQUIRE_ACTIVE_MEMBER` | `false`                         |
//! | `LIBRIS_LIBRARY_NAME`          | `Libris Library`                |
//!
//! Configuration is read-only after initialization, so no mutex needed.

use directories::ProjectDirs;
use libris_core::validation::{validate_fine_rate, validate_loan_days};
use libris_core::{CirculationPolicy, Money, DEFAULT_LOAN_DAYS};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but cannot be used.
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// No per-user data directory could be determined.
    #[error("Could not determine app data directory")]
    NoDataDir,
}

/// Desk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file. `None` means the platform default.
    pub db_path: Option<PathBuf>,

    /// Loan period offered when issuing a book.
    pub loan_days: i64,

    /// Suggested fine per calendar day late.
    pub fine_per_day: Money,

    /// Refuse loans to inactive or suspended members.
    pub require_active_member: bool,

    /// Shown in the console banner and report titles.
    pub library_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: None,
            loan_days: DEFAULT_LOAN_DAYS,
            fine_per_day: CirculationPolicy::default().fine_per_day,
            require_active_member: false,
            library_name: "Libris Library".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads configuration from `LIBRIS_*` environment variables over the
    /// defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = non_empty(lookup("LIBRIS_DB_PATH")) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = non_empty(lookup("LIBRIS_LOAN_DAYS")) {
            config.loan_days = raw
                .trim()
                .parse::<i64>()
                .map_err(|e| invalid("LIBRIS_LOAN_DAYS", &raw, e.to_string()))
                .and_then(|days| {
                    validate_loan_days(days)
                        .map_err(|e| invalid("LIBRIS_LOAN_DAYS", &raw, e.to_string()))
                })?;
        }

        if let Some(raw) = non_empty(lookup("LIBRIS_FINE_PER_DAY")) {
            config.fine_per_day = raw
                .parse::<Money>()
                .and_then(validate_fine_rate)
                .map_err(|e| invalid("LIBRIS_FINE_PER_DAY", &raw, e.to_string()))?;
        }

        if let Some(raw) = non_empty(lookup("LIBRIS_REQUIRE_ACTIVE_MEMBER")) {
            config.require_active_member = parse_bool(&raw)
                .ok_or_else(|| invalid("LIBRIS_REQUIRE_ACTIVE_MEMBER", &raw, "expected true or false"))?;
        }

        if let Some(name) = non_empty(lookup("LIBRIS_LIBRARY_NAME")) {
            config.library_name = name.trim().to_string();
        }

        Ok(config)
    }

    /// Circulation rules derived from this configuration.
    pub fn policy(&self) -> CirculationPolicy {
        CirculationPolicy {
            loan_days: self.loan_days,
            fine_per_day: self.fine_per_day,
            require_active_member: self.require_active_member,
        }
    }

    /// The configured database path, or the platform default.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/org.libris.desk/libris.db`
    /// - **Windows**: `%APPDATA%\libris\desk\data\libris.db`
    /// - **Linux**: `~/.local/share/desk/libris.db`
    ///
    /// The data directory is created if missing.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let proj_dirs = ProjectDirs::from("org", "libris", "desk").ok_or(ConfigError::NoDataDir)?;
        let data_dir = proj_dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|e| ConfigError::InvalidValue {
            key: "data directory".to_string(),
            value: data_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(data_dir.join("libris.db"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.loan_days, 14);
        assert_eq!(config.fine_per_day, Money::from_cents(50));
        assert!(!config.require_active_member);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("LIBRIS_DB_PATH", "/tmp/lib.db"),
            ("LIBRIS_LOAN_DAYS", "21"),
            ("LIBRIS_FINE_PER_DAY", "1.25"),
            ("LIBRIS_REQUIRE_ACTIVE_MEMBER", "yes"),
            ("LIBRIS_LIBRARY_NAME", " Town Library "),
        ]))
        .unwrap();

        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/lib.db"));
        assert_eq!(config.library_name, "Town Library");

        let policy = config.policy();
        assert_eq!(policy.loan_days, 21);
        assert_eq!(policy.fine_per_day, Money::from_cents(125));
        assert!(policy.require_active_member);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("LIBRIS_LOAN_DAYS", "two weeks"),
            ("LIBRIS_LOAN_DAYS", "0"),
            ("LIBRIS_FINE_PER_DAY", "-1"),
            ("LIBRIS_FINE_PER_DAY", "abc"),
            ("LIBRIS_FINE_PER_DAY", "92233720368547758.07"),
            ("LIBRIS_REQUIRE_ACTIVE_MEMBER", "maybe"),
        ] {
            let err = AppConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: ref k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }
}
