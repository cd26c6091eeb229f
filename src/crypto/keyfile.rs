//! Provisioning of the process-wide encryption key.
//!
//! The key is resolved once at startup, in this order:
//! 1. `CREDVAULT_ENCRYPTION_KEY` (base64 of 32 bytes);
//! 2. the configured key file (raw 32 bytes);
//! 3. a freshly generated key, written to the key file with owner-only
//!    permissions so the next run finds the same key.
//!
//! A key that is present but malformed is an error, never silently
//! replaced: data encrypted under the old key would become unreadable.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::encryption::{SecretCipher, KEY_LEN};
use crate::errors::{CredVaultError, Result};

/// Environment variable holding a base64-encoded key.
pub const KEY_ENV_VAR: &str = "CREDVAULT_ENCRYPTION_KEY";

/// Where the key came from, for log lines and CLI hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    KeyFile,
    Generated,
}

/// Generate a new random key file at `path`.
///
/// The file is written with restrictive permissions (owner-only read/write).
/// Fails if a file already exists there.
pub fn generate_keyfile(path: &Path) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if path.exists() {
        return Err(CredVaultError::KeyfileError(format!(
            "key file already exists at {}",
            path.display()
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rand::rng().fill_bytes(&mut *key);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                CredVaultError::KeyfileError(format!("cannot create key file directory: {e}"))
            })?;
        }
    }

    fs::write(path, &*key)
        .map_err(|e| CredVaultError::KeyfileError(format!("failed to write key file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms).map_err(|e| {
            CredVaultError::KeyfileError(format!("failed to set key file permissions: {e}"))
        })?;
    }

    Ok(key)
}

/// Load a key file from disk and validate its length.
pub fn load_keyfile(path: &Path) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if !path.exists() {
        return Err(CredVaultError::KeyfileError(format!(
            "key file not found at {}",
            path.display()
        )));
    }

    let data = Zeroizing::new(
        fs::read(path)
            .map_err(|e| CredVaultError::KeyfileError(format!("failed to read key file: {e}")))?,
    );

    to_key(&data).ok_or_else(|| {
        CredVaultError::KeyfileError(format!(
            "key file must be exactly {KEY_LEN} bytes, got {}",
            data.len()
        ))
    })
}

/// Decode a base64 key as found in the environment.
pub fn decode_key(encoded: &str) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let data = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|_| {
        CredVaultError::KeyfileError(format!("{KEY_ENV_VAR} is not valid base64"))
    })?);

    to_key(&data).ok_or_else(|| {
        CredVaultError::KeyfileError(format!(
            "{KEY_ENV_VAR} must decode to exactly {KEY_LEN} bytes, got {}",
            data.len()
        ))
    })
}

/// Encode a key for use in `CREDVAULT_ENCRYPTION_KEY`.
pub fn encode_key(key: &[u8; KEY_LEN]) -> String {
    BASE64.encode(key)
}

fn to_key(data: &[u8]) -> Option<Zeroizing<[u8; KEY_LEN]>> {
    let key: [u8; KEY_LEN] = data.try_into().ok()?;
    Some(Zeroizing::new(key))
}

/// Resolve the process key from an explicit env value or the key file.
///
/// `env_value` is passed in rather than read here so callers (and tests)
/// control the environment lookup.
pub fn resolve_key(
    env_value: Option<&str>,
    key_file: &Path,
) -> Result<(SecretCipher, KeySource)> {
    if let Some(encoded) = env_value.filter(|v| !v.trim().is_empty()) {
        let key = decode_key(encoded)?;
        return Ok((SecretCipher::new(*key), KeySource::Environment));
    }

    if key_file.exists() {
        let key = load_keyfile(key_file)?;
        return Ok((SecretCipher::new(*key), KeySource::KeyFile));
    }

    let key = generate_keyfile(key_file)?;
    tracing::info!(path = %key_file.display(), "generated new encryption key file");
    Ok((SecretCipher::new(*key), KeySource::Generated))
}

/// Resolve the process key, reading `CREDVAULT_ENCRYPTION_KEY` from the
/// process environment.
pub fn load_or_generate(key_file: &Path) -> Result<(SecretCipher, KeySource)> {
    let env_value = std::env::var(KEY_ENV_VAR).ok();
    resolve_key(env_value.as_deref(), key_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generate_and_load_keyfile_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.key");

        let generated = generate_keyfile(&path).unwrap();
        let loaded = load_keyfile(&path).unwrap();
        assert_eq!(*generated, *loaded);
    }

    #[test]
    fn generate_keyfile_fails_if_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.key");

        generate_keyfile(&path).unwrap();
        assert!(generate_keyfile(&path).is_err());
    }

    #[test]
    fn generate_keyfile_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("vault.key");

        generate_keyfile(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn load_keyfile_fails_on_wrong_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.key");
        fs::write(&path, [0u8; 16]).unwrap();

        let err = load_keyfile(&path).unwrap_err();
        assert!(err.to_string().contains("exactly 32 bytes"));
    }

    #[test]
    fn resolve_prefers_environment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.key");
        let encoded = encode_key(&[7u8; KEY_LEN]);

        let (_, source) = resolve_key(Some(&encoded), &path).unwrap();
        assert_eq!(source, KeySource::Environment);
        assert!(!path.exists(), "no key file should be written");
    }

    #[test]
    fn resolve_generates_once_then_reuses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.key");

        let (first, source) = resolve_key(None, &path).unwrap();
        assert_eq!(source, KeySource::Generated);

        let (second, source) = resolve_key(None, &path).unwrap();
        assert_eq!(source, KeySource::KeyFile);

        let sealed = first.encrypt("stable").unwrap();
        assert_eq!(second.decrypt(&sealed).unwrap().as_str(), "stable");
    }

    #[test]
    fn resolve_ignores_blank_environment_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.key");

        let (_, source) = resolve_key(Some("  "), &path).unwrap();
        assert_eq!(source, KeySource::Generated);
    }

    #[test]
    fn malformed_environment_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.key");

        assert!(resolve_key(Some("%%%"), &path).is_err());
        let short = BASE64.encode([1u8; 8]);
        assert!(resolve_key(Some(&short), &path).is_err());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn keyfile_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.key");
        generate_keyfile(&path).unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
