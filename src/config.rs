//! Configuration loading and persistence.
//!
//! Handles reading and writing the receipt-delivery configuration file.
//! The credential itself never lives here; it is stored in the OS keyring
//! (or the file-backed store in test mode) via [`crate::credentials`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{fs, path::Path, path::PathBuf};

use crate::env::APP_NAME;

/// Config directory override.
pub const CONFIG_DIR_VAR: &str = "RECEIPT_CONFIG_DIR";
/// Keyring service override.
pub const KEYRING_SERVICE_VAR: &str = "RECEIPT_KEYRING_SERVICE";
/// Keyring account override.
pub const KEYRING_ACCOUNT_VAR: &str = "RECEIPT_KEYRING_ACCOUNT";

const CONFIG_FILE: &str = "config.json";

/// Configuration for the receipt sender.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Keyring service holding the combined credential.
    pub keyring_service: String,
    /// Keyring account (user) name for the credential entry.
    pub keyring_account: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyring_service: APP_NAME.to_string(),
            keyring_account: "credentials".to_string(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `RECEIPT_CONFIG_DIR` env var: explicit override
    /// 2. Default: platform config dir joined with `receipt-delivery`
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(custom) = std::env::var(CONFIG_DIR_VAR) {
            PathBuf::from(custom)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join(APP_NAME)
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing or unreadable file falls back to defaults.
    pub fn load() -> Result<Self> {
        let dir = Self::config_dir()?;
        let mut config = Self::load_from_dir(&dir).unwrap_or_else(|e| {
            log::debug!("Using default config: {e:#}");
            Self::default()
        });
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load the config file from `dir` without applying overrides.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            anyhow::bail!("Config file not found at {}", path.display());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config at {}", path.display()))
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(service) = lookup(KEYRING_SERVICE_VAR).filter(|s| !s.is_empty()) {
            self.keyring_service = service;
        }
        if let Some(account) = lookup(KEYRING_ACCOUNT_VAR).filter(|s| !s.is_empty()) {
            self.keyring_account = account;
        }
    }

    /// Persists the configuration into `dir` with owner-only permissions.
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        #[cfg(unix)]
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.keyring_service, "receipt-delivery");
        assert_eq!(config.keyring_account, "credentials");
    }

    #[test]
    fn test_overrides_replace_values() {
        let vars: HashMap<&str, String> = [
            (KEYRING_SERVICE_VAR, "com.example.chat".to_string()),
            (KEYRING_ACCOUNT_VAR, "default".to_string()),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).cloned());

        assert_eq!(config.keyring_service, "com.example.chat");
        assert_eq!(config.keyring_account, "default");
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_from_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            keyring_service: "svc".to_string(),
            keyring_account: "acct".to_string(),
        };
        config.save_to_dir(dir.path()).unwrap();

        let loaded = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}
