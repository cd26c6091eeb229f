//! Identity registry: user enrollment and two-factor login.

use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior};
use zeroize::Zeroizing;

use crate::audit;
use crate::crypto::{password, totp};
use crate::errors::{CredVaultError, Result};

use super::credential::Session;
use super::schema::is_unique_violation;
use super::store::Vault;

/// Longest accepted username.
const MAX_USERNAME_LEN: usize = 64;

impl Vault {
    /// Register a new user and return their TOTP secret.
    ///
    /// The secret is returned in plaintext exactly once so the caller can
    /// enroll an authenticator app; only its encrypted form is stored.
    /// A duplicate username fails with `AlreadyExists`, decided by the
    /// primary key constraint rather than a prior lookup.
    pub fn register(&self, username: &str, password: &str) -> Result<Zeroizing<String>> {
        validate_username(username)?;
        if password.is_empty() {
            return Err(CredVaultError::InvalidInput(
                "password cannot be empty".into(),
            ));
        }

        // Hash and encrypt before taking the connection lock.
        let password_hash = password::hash_password(password, &self.options().argon2)?;
        let otp_secret = totp::generate_secret();
        let sealed_secret = self.cipher().encrypt(&otp_secret)?;

        self.with_conn(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(CredVaultError::storage("register"))?;

            let inserted = tx.execute(
                "INSERT INTO users (username, password_hash, otp_secret_encrypted, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    username,
                    password_hash,
                    sealed_secret,
                    Utc::now().to_rfc3339()
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(CredVaultError::AlreadyExists(username.to_string()));
                }
                Err(e) => return Err(CredVaultError::storage("register")(e)),
            }

            audit::record(&tx, audit::OP_REGISTER, username, None, None);
            tx.commit().map_err(CredVaultError::storage("register"))
        })?;

        tracing::info!(username, "user registered");
        Ok(otp_secret)
    }

    /// Check password and OTP code at the current time.
    pub fn authenticate(&self, username: &str, password: &str, otp_code: &str) -> Result<Session> {
        self.authenticate_at(username, password, otp_code, totp::now())
    }

    /// Check password and OTP code as if the clock read `unix_time`.
    ///
    /// An unknown user, a wrong password and a wrong code all fail with
    /// the same `InvalidCredentials`.  A stored secret that no longer
    /// decrypts is reported as `DecryptionFailed`.
    pub fn authenticate_at(
        &self,
        username: &str,
        password: &str,
        otp_code: &str,
        unix_time: u64,
    ) -> Result<Session> {
        let stored: Option<(String, String)> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT password_hash, otp_secret_encrypted FROM users WHERE username = ?1",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(CredVaultError::storage("authenticate"))
        })?;

        // Unknown names are not audited.
        let Some((password_hash, sealed_secret)) = stored else {
            password::equalize_timing(password, &self.options().argon2);
            tracing::warn!(username, "authentication failed");
            return Err(CredVaultError::InvalidCredentials);
        };

        if !password::verify_password(password, &password_hash)? {
            return Err(self.reject_login(username));
        }

        let otp_secret = self.cipher().decrypt(&sealed_secret)?;
        if !totp::verify_at(&otp_secret, otp_code, unix_time, self.options().otp_skew)? {
            return Err(self.reject_login(username));
        }

        self.audit(audit::OP_LOGIN, username, None, None);
        tracing::info!(username, "user authenticated");
        Ok(Session::new(username))
    }

    fn reject_login(&self, username: &str) -> CredVaultError {
        self.audit(audit::OP_LOGIN_FAILED, username, None, None);
        tracing::warn!(username, "authentication failed");
        CredVaultError::InvalidCredentials
    }
}

/// Usernames must be non-empty, at most 64 characters and free of
/// control characters.
fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(CredVaultError::InvalidInput(
            "username cannot be empty".into(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(CredVaultError::InvalidInput(format!(
            "username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(CredVaultError::InvalidInput(
            "username cannot contain control characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice@x.com").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
        assert!(validate_username("ali\nce").is_err());
    }
}
