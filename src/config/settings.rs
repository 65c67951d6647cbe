use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::password::DEFAULT_PASSWORD_LEN;
use crate::errors::{ItAccessError, Result};
use crate::store::db::DB_FILE_NAME;
use crate::store::StoreOptions;

/// Shortest generated password the settings accept.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest generated password the settings accept.
const MAX_PASSWORD_LENGTH: usize = 1024;

/// Project-level configuration, loaded from `.itaccess.toml`.
///
/// Every field has a sensible default so itaccess works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) holding the database and audit log.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Company new access records belong to when none is given.
    #[serde(default = "default_company")]
    pub default_company: String,

    /// Length of generated passwords (default: 16).
    #[serde(default = "default_password_length")]
    pub password_length: usize,

    /// Reject encrypted passwords older than this many seconds on decrypt.
    /// Unset means tokens never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ttl_secs: Option<u64>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_data_dir() -> String {
    ".itaccess".to_string()
}

fn default_company() -> String {
    "My Company".to_string()
}

fn default_password_length() -> usize {
    DEFAULT_PASSWORD_LEN
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_company: default_company(),
            password_length: default_password_length(),
            token_ttl_secs: None,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".itaccess.toml";

    /// Load settings from `<project_dir>/.itaccess.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or holds invalid values,
    /// an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            ItAccessError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&self.password_length) {
            return Err(ItAccessError::ConfigError(format!(
                "password_length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} (got {})",
                self.password_length
            )));
        }
        if self.default_company.trim().is_empty() {
            return Err(ItAccessError::ConfigError(
                "default_company cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// The data directory, resolved against the project root.
    pub fn data_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.data_dir)
    }

    /// Build the full path to the record database.
    ///
    /// Example: `project_dir/.itaccess/itaccess.db`
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        self.data_path(project_dir).join(DB_FILE_NAME)
    }

    /// Convert the settings into store-layer options.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_company: self.default_company.clone(),
            password_length: self.password_length,
            token_ttl_secs: self.token_ttl_secs,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
