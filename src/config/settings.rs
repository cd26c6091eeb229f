use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::password::Argon2Params;
use crate::crypto::totp::MAX_SKEW;
use crate::errors::{CredVaultError, Result};
use crate::vault::VaultOptions;

/// Environment variable overriding `database`.
pub const DATABASE_ENV_VAR: &str = "CREDVAULT_DATABASE";

/// Environment variable overriding `key_file`.
pub const KEY_FILE_ENV_VAR: &str = "CREDVAULT_KEY_FILE";

/// Vault configuration, loaded from `credvault.toml`.
///
/// Every field has a sensible default so CredVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite database path, relative to the project dir, or `:memory:`.
    #[serde(default = "default_database")]
    pub database: String,

    /// Path of the encryption key file, relative to the project dir.
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Issuer label shown by authenticator apps.
    #[serde(default = "default_otp_issuer")]
    pub otp_issuer: String,

    /// Accepted clock skew in 30-second steps on each side of "now".
    #[serde(default = "default_otp_skew")]
    pub otp_skew: u64,

    /// Argon2 memory cost in KiB (default: 19 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 2).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 1).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database() -> String {
    "credvault.db".to_string()
}

fn default_key_file() -> String {
    ".credvault.key".to_string()
}

fn default_otp_issuer() -> String {
    "CredVault".to_string()
}

fn default_otp_skew() -> u64 {
    1
}

fn default_argon2_memory_kib() -> u32 {
    19_456 // 19 MB
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            key_file: default_key_file(),
            otp_issuer: default_otp_issuer(),
            otp_skew: default_otp_skew(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = "credvault.toml";

    /// Load settings from `<project_dir>/credvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit file, which must exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Err(CredVaultError::ConfigNotFound(config_path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(config_path)?;

        let settings: Self = toml::from_str(&contents).map_err(|e| {
            CredVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make login unbounded.
    pub fn validate(&self) -> Result<()> {
        if self.otp_skew > MAX_SKEW {
            return Err(CredVaultError::ConfigError(format!(
                "otp_skew must be at most {MAX_SKEW} (got {})",
                self.otp_skew
            )));
        }
        Ok(())
    }

    /// Apply `CREDVAULT_DATABASE` / `CREDVAULT_KEY_FILE` overrides.
    ///
    /// `lookup` abstracts the environment so tests do not have to mutate
    /// process-global state.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(DATABASE_ENV_VAR).filter(|v| !v.is_empty()) {
            self.database = db;
        }
        if let Some(kf) = lookup(KEY_FILE_ENV_VAR).filter(|v| !v.is_empty()) {
            self.key_file = kf;
        }
    }

    /// Connection string for the vault database.
    ///
    /// `:memory:` is passed through; relative paths are resolved
    /// against `project_dir`.
    pub fn database_path(&self, project_dir: &Path) -> String {
        if self.database == crate::vault::IN_MEMORY {
            return self.database.clone();
        }
        project_dir
            .join(&self.database)
            .to_string_lossy()
            .into_owned()
    }

    /// Full path of the encryption key file.
    pub fn key_file_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.key_file)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Runtime options for `Vault::open_with`.
    pub fn vault_options(&self) -> VaultOptions {
        VaultOptions {
            argon2: self.argon2_params(),
            otp_skew: self.otp_skew,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
