//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! `SecretCipher` wraps the process-wide key and stores blobs as
//! base64 text so they fit in a `TEXT` column.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{CredVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Length of the process encryption key (256 bits).
pub const KEY_LEN: usize = 32;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt`.
///
/// Expects the first 12 bytes to be the nonce, followed by the ciphertext.
pub fn decrypt(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    if ciphertext_with_nonce.len() < NONCE_LEN {
        return Err(CredVaultError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CredVaultError::DecryptionFailed)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CredVaultError::DecryptionFailed)
}

/// The process-wide cipher used for every value the vault persists.
///
/// Built once at startup from the key provider and handed to
/// `Vault::open_with`.  The key bytes are zeroed when the cipher drops.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretCipher {
    key: [u8; KEY_LEN],
}

impl SecretCipher {
    /// Create a cipher from raw key bytes.
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Encrypt a UTF-8 value into base64 text (nonce || ciphertext || tag).
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let blob = encrypt(&self.key, plaintext.as_bytes())?;
        Ok(BASE64.encode(blob))
    }

    /// Decrypt base64 text produced by [`SecretCipher::encrypt`].
    ///
    /// Bad base64, a wrong key or any tampering all fail with
    /// `DecryptionFailed`; no partial plaintext is ever returned.
    pub fn decrypt(&self, encoded: &str) -> Result<Zeroizing<String>> {
        let blob = BASE64
            .decode(encoded)
            .map_err(|_| CredVaultError::DecryptionFailed)?;
        let plaintext = decrypt(&self.key, &blob)?;

        String::from_utf8(plaintext)
            .map(Zeroizing::new)
            .map_err(|e| {
                let mut bad_bytes = e.into_bytes();
                bad_bytes.zeroize();
                CredVaultError::DecryptionFailed
            })
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}
