//! Value types handed across the vault API.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// Proof of a successful `Vault::authenticate`.
///
/// There is no public constructor: the only way to obtain one is to pass
/// the password and OTP checks, and every ledger operation requires one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    authenticated_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            authenticated_at: Utc::now(),
        }
    }

    /// The authenticated user.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// When the checks passed.
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }
}

/// Result of `Vault::put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No row existed for the natural key; one was created.
    Inserted,
    /// The existing row's password was replaced.
    Updated,
}

impl WriteOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteOutcome::Inserted => "inserted",
            WriteOutcome::Updated => "updated",
        }
    }
}

impl std::fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decrypted service credential.
///
/// The password is wiped from memory when the value drops and is never
/// shown by `Debug`.
#[derive(Clone)]
pub struct ServiceCredential {
    pub service: String,
    pub service_username: String,
    pub password: Zeroizing<String>,
}

impl ServiceCredential {
    /// Borrow the decrypted password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredential")
            .field("service", &self.service)
            .field("service_username", &self.service_username)
            .field("password", &"<redacted>")
            .finish()
    }
}
