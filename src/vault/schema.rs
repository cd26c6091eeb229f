//! Table definitions and bootstrap for the vault database.

use rusqlite::{ffi, Connection};

use crate::errors::{CredVaultError, Result};

/// Idempotent schema.  Uniqueness of both natural keys is enforced here,
/// so the database is the final arbiter of duplicates.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    username             TEXT PRIMARY KEY,
    password_hash        TEXT NOT NULL,
    otp_secret_encrypted TEXT NOT NULL,
    created_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS services (
    id                         INTEGER PRIMARY KEY AUTOINCREMENT,
    username                   TEXT NOT NULL REFERENCES users(username),
    service                    TEXT NOT NULL,
    service_username           TEXT NOT NULL,
    service_password_encrypted TEXT NOT NULL,
    created_at                 TEXT NOT NULL,
    updated_at                 TEXT NOT NULL,
    UNIQUE (username, service, service_username)
);

CREATE TABLE IF NOT EXISTS audit_log (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    operation TEXT NOT NULL,
    username  TEXT NOT NULL,
    service   TEXT,
    details   TEXT
);

CREATE INDEX IF NOT EXISTS idx_audit_log_username ON audit_log (username, id);
";

/// Configure the connection and create any missing tables.
pub fn bootstrap(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(CredVaultError::storage("enable foreign keys"))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(CredVaultError::storage("set busy timeout"))?;
    conn.execute_batch(SCHEMA)
        .map_err(CredVaultError::storage("create tables"))?;

    tracing::debug!("vault schema ready");
    Ok(())
}

/// True when `err` is a PRIMARY KEY or UNIQUE constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
