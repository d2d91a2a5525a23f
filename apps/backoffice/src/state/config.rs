//! # Configuration State
//!
//! Process configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`ROBODESK_*`)
//! 2. Defaults (this file)
//!
//! Company settings (contract mask, billing schedule, currency) are not
//! here; they live in the `settings` table and are loaded per request.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the SQLite file path.
pub const ENV_DB_PATH: &str = "ROBODESK_DB_PATH";
/// Environment variable holding the document store root.
pub const ENV_STORAGE_DIR: &str = "ROBODESK_STORAGE_DIR";
/// Environment variable holding the tracing filter.
pub const ENV_LOG: &str = "ROBODESK_LOG";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Root directory of the local document store.
    pub storage_dir: PathBuf,

    /// Tracing filter directive, e.g. `robodesk=debug`.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from("./robodesk.db"),
            storage_dir: PathBuf::from("./documents"),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Creates configuration from environment variables and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an explicit variable source.
    ///
    /// Blank values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(dir) = value(ENV_STORAGE_DIR) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(filter) = value(ENV_LOG) {
            config.log_filter = filter;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let env: HashMap<&str, &str> = [
            (ENV_DB_PATH, "/var/lib/robodesk/data.db"),
            (ENV_STORAGE_DIR, "  "),
            (ENV_LOG, "robodesk_db=debug"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.db_path, PathBuf::from("/var/lib/robodesk/data.db"));
        assert_eq!(config.storage_dir, PathBuf::from("./documents"));
        assert_eq!(config.log_filter, "robodesk_db=debug");
    }
}
