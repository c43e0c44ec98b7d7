use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PassVaultError, Result};

/// Vault configuration, loaded from `<data_dir>/passvault.toml`.
///
/// Every field has a sensible default so PassVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Master key file, relative to the data directory unless absolute.
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Credential database, relative to the data directory unless absolute.
    #[serde(default = "default_database")]
    pub database: String,

    /// Length of passwords produced by `generate` and `add --generate`.
    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_key_file() -> String {
    "master.key".to_string()
}

fn default_database() -> String {
    "passwords.db".to_string()
}

fn default_password_length() -> usize {
    16
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            database: default_database(),
            password_length: default_password_length(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the data directory.
    pub const FILE_NAME: &'static str = "passvault.toml";

    /// Load settings from `<data_dir>/passvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| PassVaultError::io("read config", &config_path, e))?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PassVaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.password_length == 0 {
            return Err(PassVaultError::Config(
                "password_length must be greater than zero".into(),
            ));
        }

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Full path to the master key file.
    ///
    /// Example: `data_dir/master.key`
    pub fn key_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.key_file)
    }

    /// Full path to the credential database.
    ///
    /// Example: `data_dir/passwords.db`
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
