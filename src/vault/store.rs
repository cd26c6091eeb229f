//! The `Vault` handle: one database connection plus the process cipher.
//!
//! Identity operations live in `registry.rs` and credential operations in
//! `ledger.rs`; both are `impl Vault` blocks over the state defined here.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::audit::{self, AuditEntry};
use crate::config::Settings;
use crate::crypto::{keyfile, totp};
use crate::crypto::password::Argon2Params;
use crate::crypto::SecretCipher;
use crate::errors::{CredVaultError, Result};

use super::credential::Session;
use super::schema;

/// Connection string that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Tunables the vault needs at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultOptions {
    /// Parameters for hashing new login passwords.
    pub argon2: Argon2Params,
    /// Accepted OTP clock skew, in steps on each side of "now".
    pub otp_skew: u64,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            argon2: Argon2Params::default(),
            otp_skew: 1,
        }
    }
}

/// The main vault handle.
///
/// Safe to share between threads: the connection sits behind a mutex and
/// every mutation runs in its own transaction.
pub struct Vault {
    /// `None` once `close` has run.
    conn: Mutex<Option<Connection>>,

    /// Encrypts every OTP secret and service password we persist.
    cipher: SecretCipher,

    options: VaultOptions,
}

impl Vault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open the vault described by `settings`.
    ///
    /// Resolves the encryption key (environment, key file, or a freshly
    /// generated key file) and then opens the database.  Relative paths
    /// are resolved against `project_dir`.
    pub fn open(settings: &Settings, project_dir: &Path) -> Result<Self> {
        let key_path = settings.key_file_path(project_dir);
        let (cipher, source) = keyfile::load_or_generate(&key_path)?;
        tracing::debug!(?source, "encryption key resolved");

        Self::open_with(
            &settings.database_path(project_dir),
            cipher,
            settings.vault_options(),
        )
    }

    /// Open a vault over `database` with an explicitly provided cipher.
    ///
    /// `database` is a SQLite file path or [`IN_MEMORY`].  The schema is
    /// created if missing.
    pub fn open_with(database: &str, cipher: SecretCipher, options: VaultOptions) -> Result<Self> {
        if options.otp_skew > totp::MAX_SKEW {
            return Err(CredVaultError::ConfigError(format!(
                "otp_skew must be at most {} (got {})",
                totp::MAX_SKEW,
                options.otp_skew
            )));
        }

        let conn = if database == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(database)
        }
        .map_err(CredVaultError::storage("open database"))?;

        // Set restrictive permissions on the database file (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if database != IN_MEMORY {
                let perms = std::fs::Permissions::from_mode(0o600);
                if let Err(e) = std::fs::set_permissions(database, perms) {
                    tracing::warn!(database, error = %e, "could not restrict vault database permissions");
                }
            }
        }

        schema::bootstrap(&conn)?;
        tracing::info!(database, "vault opened");

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            cipher,
            options,
        })
    }

    /// Release the database connection.  Calling it again is a no-op.
    pub fn close(&self) {
        if let Some(conn) = self.lock().take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!(error = %e, "error while closing vault database");
            }
            tracing::debug!("vault closed");
        }
    }

    /// Returns `true` once `close` has run.
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn options(&self) -> &VaultOptions {
        &self.options
    }

    pub(crate) fn cipher(&self) -> &SecretCipher {
        &self.cipher
    }

    // ------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------

    /// Recent audit entries for the session's user, most recent first.
    pub fn audit_entries(
        &self,
        session: &Session,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AuditEntry>> {
        self.with_conn(|conn| audit::query(conn, session.username(), limit, since))
    }

    /// Best-effort audit write; a closed vault is silently skipped.
    pub(crate) fn audit(
        &self,
        operation: &str,
        username: &str,
        service: Option<&str>,
        details: Option<&str>,
    ) {
        if let Some(conn) = self.lock().as_ref() {
            audit::record(conn, operation, username, service, details);
        }
    }

    // ------------------------------------------------------------------
    // Connection access
    // ------------------------------------------------------------------

    /// Run `f` with exclusive access to the open connection.
    pub(crate) fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut guard = self.lock();
        let conn = guard.as_mut().ok_or(CredVaultError::VaultClosed)?;
        f(conn)
    }

    /// A panic while holding the lock unwinds any open transaction, which
    /// rolls it back, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("closed", &self.is_closed())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
