//! Login password hashing using Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
//! so every record carries its own random salt and the parameters it was
//! hashed with.  Verification re-derives and compares; nothing is ever
//! decrypted.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::errors::{CredVaultError, Result};

/// Length of the per-record salt in bytes (128 bits).
const SALT_LEN: usize = 16;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Salt used only to burn the same amount of work for unknown users.
const TIMING_SALT: &[u8; SALT_LEN] = b"credvault-timing";

/// Configurable Argon2id parameters.
///
/// These map 1:1 to the fields in `Settings` so the CLI can pass
/// whatever the user configured in `credvault.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 19 456 = 19 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 2).
    pub iterations: u32,
    /// Parallelism lanes (default: 1).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Params {
    /// Build an Argon2id hasher, enforcing minimum parameters.
    fn hasher(&self) -> Result<Argon2<'static>> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(CredVaultError::PasswordHash(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 {
            return Err(CredVaultError::PasswordHash(
                "Argon2 iterations must be at least 1".into(),
            ));
        }
        if self.parallelism < 1 {
            return Err(CredVaultError::PasswordHash(
                "Argon2 parallelism must be at least 1".into(),
            ));
        }

        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| CredVaultError::PasswordHash(format!("invalid Argon2 params: {e}")))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a login password with a fresh random salt.
pub fn hash_password(password: &str, params: &Argon2Params) -> Result<String> {
    let argon2 = params.hasher()?;

    let mut salt_bytes = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CredVaultError::PasswordHash(format!("salt encoding failed: {e}")))?;

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredVaultError::PasswordHash(format!("Argon2id hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Check `password` against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch.  The parameters embedded in the hash
/// are used, so changing the configured params never locks out old users.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| CredVaultError::PasswordHash(format!("stored hash is malformed: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredVaultError::PasswordHash(format!(
            "Argon2id verification failed: {e}"
        ))),
    }
}

/// Spend roughly the cost of one verification without checking anything.
///
/// Called for unknown usernames so a failed login takes the same time
/// whether or not the account exists.
pub fn equalize_timing(password: &str, params: &Argon2Params) {
    if let Ok(argon2) = params.hasher() {
        let mut sink = [0u8; 32];
        let _ = argon2.hash_password_into(password.as_bytes(), TIMING_SALT, &mut sink);
    }
}
