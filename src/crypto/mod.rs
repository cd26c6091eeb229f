//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and the process-wide `SecretCipher` (`encryption`)
//! - Argon2id login password hashing (`password`)
//! - RFC 6238 TOTP secrets, codes and provisioning URIs (`totp`)
//! - Loading or generating the encryption key file (`keyfile`)

pub mod encryption;
pub mod keyfile;
pub mod password;
pub mod totp;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{SecretCipher, hash_password, ...};
pub use encryption::{decrypt, encrypt, SecretCipher, KEY_LEN};
pub use keyfile::{load_or_generate, resolve_key, KeySource};
pub use password::{hash_password, verify_password, Argon2Params};
