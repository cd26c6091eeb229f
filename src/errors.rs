use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in CredVault.
///
/// Messages may name the operation, the username or the service, but
/// never carry a password, an OTP secret or key material.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Identity errors ---
    #[error("User '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid username, password, or OTP code")]
    InvalidCredentials,

    // --- Ledger errors ---
    #[error("No credentials found for {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong encryption key or corrupted data")]
    DecryptionFailed,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // --- Storage errors ---
    #[error("Storage error during {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Vault is closed")]
    VaultClosed,

    // --- Key file errors ---
    #[error("Key file error: {0}")]
    KeyfileError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Coarse classification of a [`CredVaultError`] so callers can decide
/// how to react without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Natural-key collision (duplicate registration).
    Conflict,
    /// Username, password or OTP mismatch. Never says which.
    NotAuthenticated,
    /// A query matched zero rows.
    NotFound,
    /// Ciphertext failed its integrity check.
    Decryption,
    /// Connection or transaction failure; the caller may retry.
    Storage,
    /// Bad input, configuration or environment problems.
    Invalid,
}

impl CredVaultError {
    /// Build a storage error tagged with the operation that failed.
    pub fn storage(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| CredVaultError::Storage { op, source }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CredVaultError::AlreadyExists(_) => ErrorKind::Conflict,
            CredVaultError::InvalidCredentials => ErrorKind::NotAuthenticated,
            CredVaultError::NotFound(_) => ErrorKind::NotFound,
            CredVaultError::DecryptionFailed => ErrorKind::Decryption,
            CredVaultError::Storage { .. } | CredVaultError::VaultClosed => ErrorKind::Storage,
            CredVaultError::InvalidInput(_)
            | CredVaultError::EncryptionFailed(_)
            | CredVaultError::PasswordHash(_)
            | CredVaultError::KeyfileError(_)
            | CredVaultError::ConfigError(_)
            | CredVaultError::ConfigNotFound(_)
            | CredVaultError::Io(_)
            | CredVaultError::CommandFailed(_) => ErrorKind::Invalid,
        }
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
