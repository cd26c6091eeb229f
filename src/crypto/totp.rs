//! Time-based one-time passwords (RFC 6238) over HMAC-SHA1.
//!
//! Secrets are 20 random bytes rendered as 32 base32 characters, which is
//! what standard authenticator apps expect.  Codes are 6 digits with a
//! 30-second step.

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::errors::{CredVaultError, Result};

/// Raw secret length in bytes (160 bits, 32 base32 characters).
pub const SECRET_LEN: usize = 20;

/// Length of one TOTP window in seconds.
pub const STEP_SECS: u64 = 30;

/// Largest accepted clock skew, in steps on each side of "now".
pub const MAX_SKEW: u64 = 10;

/// Number of digits in a code.
pub const DIGITS: usize = 6;

/// Generate a fresh random base32 secret.
pub fn generate_secret() -> Zeroizing<String> {
    let mut raw = Zeroizing::new([0u8; SECRET_LEN]);
    rand::rng().fill_bytes(&mut *raw);
    Zeroizing::new(BASE32_NOPAD.encode(&*raw))
}

/// Decode a base32 secret, tolerating lowercase, spaces and `=` padding.
pub fn decode_secret(secret: &str) -> Result<Zeroizing<Vec<u8>>> {
    let normalized: Zeroizing<String> = Zeroizing::new(
        secret
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '=')
            .map(|c| c.to_ascii_uppercase())
            .collect(),
    );

    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map(Zeroizing::new)
        .map_err(|_| CredVaultError::InvalidInput("OTP secret is not valid base32".into()))
}

/// RFC 4226 HOTP value for `counter`, already reduced to `DIGITS` digits.
fn hotp(key: &[u8], counter: u64) -> Result<u32> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| CredVaultError::InvalidInput(format!("OTP key rejected: {e}")))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation.
    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    Ok(binary % 10u32.pow(DIGITS as u32))
}

fn format_code(value: u32) -> String {
    format!("{value:0width$}", width = DIGITS)
}

/// The time step containing `unix_time`.
pub fn step_at(unix_time: u64) -> u64 {
    unix_time / STEP_SECS
}

/// Compute the code for `secret` at `unix_time`.
pub fn code_at(secret: &str, unix_time: u64) -> Result<String> {
    let key = decode_secret(secret)?;
    Ok(format_code(hotp(&key, step_at(unix_time))?))
}

/// Check `code` against every step within `skew` steps of `unix_time`.
///
/// Malformed codes (not exactly six ASCII digits) simply do not match.
/// `skew` is capped at [`MAX_SKEW`].
/// All candidate windows are compared so the running time does not
/// depend on which window matched.
pub fn verify_at(secret: &str, code: &str, unix_time: u64, skew: u64) -> Result<bool> {
    let code = code.trim();
    if code.len() != DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(false);
    }

    let key = decode_secret(secret)?;
    let skew = skew.min(MAX_SKEW);
    let current = step_at(unix_time);
    let first = current.saturating_sub(skew);
    let last = current.saturating_add(skew);

    let mut matched = subtle::Choice::from(0u8);
    for counter in first..=last {
        let candidate = format_code(hotp(&key, counter)?);
        matched |= candidate.as_bytes().ct_eq(code.as_bytes());
    }

    Ok(matched.into())
}

/// Current UNIX time in seconds.
pub fn now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// Build the `otpauth://` URI authenticator apps enroll from.
pub fn provisioning_uri(secret: &str, account: &str, issuer: &str) -> String {
    let issuer = percent_encode(issuer);
    let account = percent_encode(account);
    format!(
        "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}&algorithm=SHA1&digits={DIGITS}&period={STEP_SECS}"
    )
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Base32 of the RFC 6238 SHA1 seed "12345678901234567890".
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rfc6238_vectors() {
        assert_eq!(code_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(code_at(RFC_SECRET, 1_111_111_109).unwrap(), "081804");
        assert_eq!(code_at(RFC_SECRET, 1_234_567_890).unwrap(), "005924");
        assert_eq!(code_at(RFC_SECRET, 2_000_000_000).unwrap(), "279037");
    }

    #[test]
    fn generated_secret_is_32_base32_chars() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)));
        assert_eq!(decode_secret(&secret).unwrap().len(), SECRET_LEN);
    }

    #[test]
    fn decode_tolerates_formatting() {
        let spaced = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq";
        assert_eq!(
            decode_secret(spaced).unwrap().as_slice(),
            b"12345678901234567890"
        );
        assert!(decode_secret("not base32!").is_err());
    }

    #[test]
    fn verify_accepts_adjacent_windows_only() {
        let t = 1_700_000_000;
        let code = code_at(RFC_SECRET, t).unwrap();

        assert!(verify_at(RFC_SECRET, &code, t, 1).unwrap());
        assert!(verify_at(RFC_SECRET, &code, t + STEP_SECS, 1).unwrap());
        assert!(verify_at(RFC_SECRET, &code, t - STEP_SECS, 1).unwrap());
        assert!(!verify_at(RFC_SECRET, &code, t + 2 * STEP_SECS, 1).unwrap());
        assert!(!verify_at(RFC_SECRET, &code, t - 2 * STEP_SECS, 1).unwrap());
    }

    #[test]
    fn zero_skew_is_exact() {
        let t = 1_700_000_000;
        let code = code_at(RFC_SECRET, t).unwrap();
        assert!(verify_at(RFC_SECRET, &code, t, 0).unwrap());
        assert!(!verify_at(RFC_SECRET, &code, t + STEP_SECS, 0).unwrap());
    }

    #[test]
    fn malformed_codes_never_match() {
        let t = 1_700_000_000;
        assert!(!verify_at(RFC_SECRET, "", t, 1).unwrap());
        assert!(!verify_at(RFC_SECRET, "12345", t, 1).unwrap());
        assert!(!verify_at(RFC_SECRET, "1234567", t, 1).unwrap());
        assert!(!verify_at(RFC_SECRET, "12a456", t, 1).unwrap());
    }

    #[test]
    fn verify_near_epoch_does_not_underflow() {
        let code = code_at(RFC_SECRET, 0).unwrap();
        assert!(verify_at(RFC_SECRET, &code, 0, 1).unwrap());
    }

    #[test]
    fn provisioning_uri_is_encoded() {
        let uri = provisioning_uri(RFC_SECRET, "alice@x.com", "Cred Vault");
        assert!(uri.starts_with("otpauth://totp/Cred%20Vault:alice%40x.com?"));
        assert!(uri.contains(&format!("secret={RFC_SECRET}")));
        assert!(uri.contains("issuer=Cred%20Vault"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
    }

    #[test]
    fn skew_is_capped() {
        let t = 1_700_000_010;
        let code = code_at(RFC_SECRET, t).unwrap();
        let far = t + (MAX_SKEW + 1) * STEP_SECS;
        assert!(!verify_at(RFC_SECRET, &code, far, u64::MAX).unwrap());
        assert!(verify_at(RFC_SECRET, &code, t + MAX_SKEW * STEP_SECS, u64::MAX).unwrap());
    }
}
