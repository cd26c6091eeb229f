//! Audit log — operation history kept in the vault database.
//!
//! Every register, login attempt, credential write and credential read
//! appends a row to `audit_log`.  Rows name the user and service but never
//! carry a password, OTP code or secret.
//!
//! Recording is best-effort: a failed insert is reported through `tracing`
//! and never fails the parent operation.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::{CredVaultError, Result};

pub const OP_REGISTER: &str = "register";
pub const OP_LOGIN: &str = "login";
pub const OP_LOGIN_FAILED: &str = "login-failed";
pub const OP_PUT: &str = "put";
pub const OP_READ: &str = "read";

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub username: String,
    pub service: Option<String>,
    pub details: Option<String>,
}

/// Record an operation. Fire-and-forget — errors are logged, not returned.
pub fn record(
    conn: &Connection,
    operation: &str,
    username: &str,
    service: Option<&str>,
    details: Option<&str>,
) {
    let now = Utc::now().to_rfc3339();
    if let Err(e) = conn.execute(
        "INSERT INTO audit_log (timestamp, operation, username, service, details)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![now, operation, username, service, details],
    ) {
        tracing::warn!(operation, username, error = %e, "failed to write audit entry");
    }
}

/// Query recent audit entries for one user.
///
/// - `limit`: maximum number of entries to return (most recent first).
/// - `since`: if provided, only return entries at or after this timestamp.
pub fn query(
    conn: &Connection,
    username: &str,
    limit: usize,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<AuditEntry>> {
    let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
    let since = since.map(|ts| ts.to_rfc3339());

    let mut stmt = conn
        .prepare(
            "SELECT id, timestamp, operation, username, service, details
             FROM audit_log
             WHERE username = ?1 AND (?2 IS NULL OR timestamp >= ?2)
             ORDER BY id DESC
             LIMIT ?3",
        )
        .map_err(CredVaultError::storage("audit query"))?;

    let rows = stmt
        .query_map(rusqlite::params![username, since, limit_i64], |row| {
            let ts_str: String = row.get(1)?;
            let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

            Ok(AuditEntry {
                id: row.get(0)?,
                timestamp,
                operation: row.get(2)?,
                username: row.get(3)?,
                service: row.get(4)?,
                details: row.get(5)?,
            })
        })
        .map_err(CredVaultError::storage("audit query"))?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(CredVaultError::storage("audit row"))?);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::schema;

    fn db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::bootstrap(&conn).unwrap();
        conn
    }

    #[test]
    fn record_and_query_roundtrip() {
        let conn = db();

        record(&conn, OP_REGISTER, "alice", None, None);
        record(&conn, OP_PUT, "alice", Some("github"), Some("inserted"));
        record(&conn, OP_READ, "alice", Some("github"), None);

        let entries = query(&conn, "alice", 10, None).unwrap();
        assert_eq!(entries.len(), 3);

        // Most recent first.
        assert_eq!(entries[0].operation, OP_READ);
        assert_eq!(entries[1].operation, OP_PUT);
        assert_eq!(entries[1].details.as_deref(), Some("inserted"));
        assert_eq!(entries[2].operation, OP_REGISTER);
        assert!(entries[2].service.is_none());
    }

    #[test]
    fn query_is_scoped_to_user() {
        let conn = db();

        record(&conn, OP_LOGIN, "alice", None, None);
        record(&conn, OP_LOGIN, "bob", None, None);

        let entries = query(&conn, "bob", 10, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "bob");
    }

    #[test]
    fn query_with_limit() {
        let conn = db();

        for i in 0..10 {
            record(&conn, OP_PUT, "alice", Some(&format!("svc-{i}")), None);
        }

        let entries = query(&conn, "alice", 3, None).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].service.as_deref(), Some("svc-9"));
    }

    #[test]
    fn query_with_since_filter() {
        let conn = db();

        record(&conn, OP_LOGIN, "alice", None, None);

        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(query(&conn, "alice", 10, Some(past)).unwrap().len(), 1);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(query(&conn, "alice", 10, Some(future)).unwrap().is_empty());
    }

    #[test]
    fn record_without_table_does_not_panic() {
        let conn = Connection::open_in_memory().unwrap();
        record(&conn, OP_LOGIN, "alice", None, None);
    }
}
