//! Credential ledger: encrypted per-service passwords with upsert writes.

use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior};

use crate::audit;
use crate::errors::{CredVaultError, Result};

use super::credential::{ServiceCredential, Session, WriteOutcome};
use super::store::Vault;

/// A row as stored, before decryption.
struct SealedRow {
    service: String,
    service_username: String,
    sealed_password: String,
}

impl Vault {
    /// Store a service password for the session's user.
    ///
    /// At most one row exists per (user, service, service username): a
    /// second write replaces the password and reports `Updated`.  The
    /// lookup and the write share one IMMEDIATE transaction, so two
    /// writers can never both see "no row" for the same key.
    pub fn put(
        &self,
        session: &Session,
        service: &str,
        service_username: &str,
        service_password: &str,
    ) -> Result<WriteOutcome> {
        require_non_empty("service", service)?;
        require_non_empty("service username", service_username)?;

        let username = session.username();
        let sealed = self.cipher().encrypt(service_password)?;

        let outcome = self.with_conn(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(CredVaultError::storage("put"))?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM services
                     WHERE username = ?1 AND service = ?2 AND service_username = ?3",
                    rusqlite::params![username, service, service_username],
                    |row| row.get(0),
                )
                .optional()
                .map_err(CredVaultError::storage("put"))?;

            let now = Utc::now().to_rfc3339();
            let outcome = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE services
                         SET service_password_encrypted = ?1, updated_at = ?2
                         WHERE id = ?3",
                        rusqlite::params![sealed, now, id],
                    )
                    .map_err(CredVaultError::storage("put"))?;
                    WriteOutcome::Updated
                }
                None => {
                    tx.execute(
                        "INSERT INTO services
                         (username, service, service_username, service_password_encrypted,
                          created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                        rusqlite::params![username, service, service_username, sealed, now],
                    )
                    .map_err(CredVaultError::storage("put"))?;
                    WriteOutcome::Inserted
                }
            };

            audit::record(&tx, audit::OP_PUT, username, Some(service), Some(outcome.as_str()));
            tx.commit().map_err(CredVaultError::storage("put"))?;
            Ok(outcome)
        })?;

        tracing::info!(username, service, %outcome, "credential stored");
        Ok(outcome)
    }

    /// All credentials the session's user holds for `service`, ordered by
    /// service username.  Zero rows is `NotFound`, not an empty list.
    pub fn get_by_service(&self, session: &Session, service: &str) -> Result<Vec<ServiceCredential>> {
        let username = session.username();

        let rows = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT service, service_username, service_password_encrypted
                     FROM services
                     WHERE username = ?1 AND service = ?2
                     ORDER BY service_username",
                )
                .map_err(CredVaultError::storage("get by service"))?;
            collect_rows(&mut stmt, rusqlite::params![username, service], "get by service")
        })?;

        if rows.is_empty() {
            return Err(CredVaultError::NotFound(format!("service '{service}'")));
        }

        let credentials = self.open_rows(rows)?;
        self.audit(audit::OP_READ, username, Some(service), None);
        Ok(credentials)
    }

    /// Every credential the session's user holds, ordered by service and
    /// then service username.  Zero rows is `NotFound`.
    pub fn get_all(&self, session: &Session) -> Result<Vec<ServiceCredential>> {
        let username = session.username();

        let rows = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT service, service_username, service_password_encrypted
                     FROM services
                     WHERE username = ?1
                     ORDER BY service, service_username",
                )
                .map_err(CredVaultError::storage("get all"))?;
            collect_rows(&mut stmt, rusqlite::params![username], "get all")
        })?;

        if rows.is_empty() {
            return Err(CredVaultError::NotFound(format!("user '{username}'")));
        }

        let credentials = self.open_rows(rows)?;
        self.audit(audit::OP_READ, username, None, Some("all"));
        Ok(credentials)
    }

    /// Decrypt rows; any failure aborts the whole read.
    fn open_rows(&self, rows: Vec<SealedRow>) -> Result<Vec<ServiceCredential>> {
        rows.into_iter()
            .map(|row| -> Result<ServiceCredential> {
                Ok(ServiceCredential {
                    password: self.cipher().decrypt(&row.sealed_password)?,
                    service: row.service,
                    service_username: row.service_username,
                })
            })
            .collect()
    }
}

fn collect_rows(
    stmt: &mut rusqlite::Statement<'_>,
    params: impl rusqlite::Params,
    op: &'static str,
) -> Result<Vec<SealedRow>> {
    let rows = stmt
        .query_map(params, |row| {
            Ok(SealedRow {
                service: row.get(0)?,
                service_username: row.get(1)?,
                sealed_password: row.get(2)?,
            })
        })
        .map_err(CredVaultError::storage(op))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(CredVaultError::storage(op))?);
    }
    Ok(out)
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CredVaultError::InvalidInput(format!("{field} cannot be empty")));
    }
    Ok(())
}
