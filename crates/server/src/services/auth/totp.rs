//! Time-based one-time passwords (RFC 6238) and recovery codes.
//!
//! TOTP parameters are the ones every authenticator app defaults to:
//! HMAC-SHA1, 30 second steps, 6 digits. Codes from one step either side of
//! the current one are accepted to allow for clock drift.

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::seq::IndexedRandom;
use sha1::Sha1;
use sha2::{Digest, Sha256};

type HmacSha1 = Hmac<Sha1>;

/// Secret length in bytes (160 bits, as recommended by RFC 4226).
pub const SECRET_LEN: usize = 20;
/// Seconds per TOTP step.
pub const STEP_SECONDS: i64 = 30;
/// Digits in a TOTP code.
pub const DIGITS: u32 = 6;
/// Steps accepted either side of the current step.
pub const WINDOW: i64 = 1;
/// Recovery codes issued at a time.
pub const RECOVERY_CODE_COUNT: usize = 10;

const RECOVERY_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
const RECOVERY_HALF_LEN: usize = 5;

/// Generate a random TOTP secret.
#[must_use]
pub fn generate_secret() -> Vec<u8> {
    let mut secret = vec![0u8; SECRET_LEN];
    rand::rng().fill_bytes(&mut secret);
    secret
}

/// Base32 (no padding), the form authenticator apps expect.
#[must_use]
pub fn encode_secret(secret: &[u8]) -> String {
    BASE32_NOPAD.encode(secret)
}

/// Decode a base32 secret, ignoring case, spaces and padding.
#[must_use]
pub fn decode_secret(encoded: &str) -> Option<Vec<u8>> {
    let cleaned: String = encoded
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    BASE32_NOPAD.decode(cleaned.as_bytes()).ok()
}

/// The step containing `unix_seconds`.
#[must_use]
pub const fn step_at(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(STEP_SECONDS)
}

/// HOTP value for a counter (RFC 4226 dynamic truncation).
fn hotp(secret: &[u8], counter: u64) -> Option<u32> {
    let mut mac = HmacSha1::new_from_slice(secret).ok()?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = usize::from(digest.last()? & 0x0f);
    let bytes: [u8; 4] = digest.get(offset..offset + 4)?.try_into().ok()?;
    let value = u32::from_be_bytes(bytes) & 0x7fff_ffff;

    Some(value % 10u32.pow(DIGITS))
}

/// The code for a given step, zero-padded.
#[must_use]
pub fn code_at(secret: &[u8], step: i64) -> Option<String> {
    let counter = u64::try_from(step).ok()?;
    hotp(secret, counter).map(|code| format!("{code:0width$}", width = DIGITS as usize))
}

/// Whether `input` looks like a TOTP code (exactly six digits).
#[must_use]
pub fn is_totp_code(input: &str) -> bool {
    input.len() == DIGITS as usize && input.bytes().all(|b| b.is_ascii_digit())
}

/// Check a code against the steps around `unix_seconds`.
///
/// Returns the matching step so the caller can reject its reuse.
#[must_use]
pub fn verify(secret: &[u8], code: &str, unix_seconds: i64) -> Option<i64> {
    if !is_totp_code(code) {
        return None;
    }

    let current = step_at(unix_seconds);
    (current - WINDOW..=current + WINDOW)
        .find(|&step| code_at(secret, step).is_some_and(|expected| expected == code))
}

/// `otpauth://` URI for QR codes.
#[must_use]
pub fn otpauth_uri(issuer: &str, account: &str, secret_b32: &str) -> String {
    let issuer = urlencoding::encode(issuer);
    let account = urlencoding::encode(account);
    format!(
        "otpauth://totp/{issuer}:{account}?secret={secret_b32}&issuer={issuer}\
         &algorithm=SHA1&digits={DIGITS}&period={STEP_SECONDS}"
    )
}

// =============================================================================
// Recovery codes
// =============================================================================

/// Generate a fresh set of recovery codes (`xxxxx-xxxxx`).
#[must_use]
pub fn generate_recovery_codes() -> Vec<String> {
    let mut rng = rand::rng();
    (0..RECOVERY_CODE_COUNT)
        .map(|_| {
            let mut half = || -> String {
                (0..RECOVERY_HALF_LEN)
                    .filter_map(|_| RECOVERY_ALPHABET.choose(&mut rng).map(|&b| char::from(b)))
                    .collect()
            };
            let first = half();
            let second = half();
            format!("{first}-{second}")
        })
        .collect()
}

/// Canonical form of a typed recovery code, or `None` if it isn't one.
///
/// Case, surrounding whitespace and a missing dash are tolerated.
#[must_use]
pub fn normalize_recovery_code(input: &str) -> Option<String> {
    let compact: String = input
        .trim()
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if compact.len() != RECOVERY_HALF_LEN * 2 || !compact.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }

    let (first, second) = compact.split_at(RECOVERY_HALF_LEN);
    Some(format!("{first}-{second}"))
}

/// SHA-256 hex digest stored in place of a recovery code.
#[must_use]
pub fn hash_recovery_code(normalized: &str) -> String {
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RFC_SECRET: &[u8] = b"12345678901234567890";

    #[test]
    fn test_rfc6238_vectors() {
        // RFC 6238 appendix B (SHA1), last six digits
        assert_eq!(code_at(RFC_SECRET, step_at(59)).unwrap(), "287082");
        assert_eq!(code_at(RFC_SECRET, step_at(1_111_111_109)).unwrap(), "081804");
        assert_eq!(code_at(RFC_SECRET, step_at(1_234_567_890)).unwrap(), "005924");
        assert_eq!(code_at(RFC_SECRET, step_at(2_000_000_000)).unwrap(), "279037");
    }

    #[test]
    fn test_verify_window() {
        let now = 1_234_567_890;
        let step = step_at(now);
        let code = code_at(RFC_SECRET, step).unwrap();

        assert_eq!(verify(RFC_SECRET, &code, now), Some(step));
        assert_eq!(verify(RFC_SECRET, &code, now + STEP_SECONDS), Some(step));
        assert_eq!(verify(RFC_SECRET, &code, now - STEP_SECONDS), Some(step));
        assert_eq!(verify(RFC_SECRET, &code, now + 3 * STEP_SECONDS), None);
    }

    #[test]
    fn test_verify_rejects_malformed_codes() {
        assert_eq!(verify(RFC_SECRET, "28708", 59), None);
        assert_eq!(verify(RFC_SECRET, "2870823", 59), None);
        assert_eq!(verify(RFC_SECRET, "28708a", 59), None);
    }

    #[test]
    fn test_secret_roundtrip_tolerates_formatting() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_LEN);

        let encoded = encode_secret(&secret);
        assert!(!encoded.contains('='));
        assert_eq!(encoded.len(), 32);

        let spaced = encoded
            .to_lowercase()
            .as_bytes()
            .chunks(4)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(decode_secret(&spaced).unwrap(), secret);
        assert!(decode_secret("not base32!").is_none());
    }

    #[test]
    fn test_otpauth_uri() {
        let uri = otpauth_uri("Midnight Owls", "sam@owls.band", "JBSWY3DPEHPK3PXP");
        assert_eq!(
            uri,
            "otpauth://totp/Midnight%20Owls:sam%40owls.band?secret=JBSWY3DPEHPK3PXP\
             &issuer=Midnight%20Owls&algorithm=SHA1&digits=6&period=30"
        );
    }

    #[test]
    fn test_recovery_codes_format() {
        let codes = generate_recovery_codes();
        assert_eq!(codes.len(), RECOVERY_CODE_COUNT);
        for code in &codes {
            assert_eq!(normalize_recovery_code(code).as_deref(), Some(code.as_str()));
            assert_eq!(code.len(), 11);
            assert_eq!(code.chars().nth(5), Some('-'));
        }
    }

    #[test]
    fn test_normalize_recovery_code() {
        assert_eq!(
            normalize_recovery_code("  ABCDE-23456 ").as_deref(),
            Some("abcde-23456")
        );
        assert_eq!(
            normalize_recovery_code("abcde23456").as_deref(),
            Some("abcde-23456")
        );
        assert!(normalize_recovery_code("abcd-23456").is_none());
        assert!(normalize_recovery_code("abcde_23456").is_none());
        assert!(normalize_recovery_code("123456").is_none());
    }

    #[test]
    fn test_hash_recovery_code_is_stable_hex() {
        let hash = hash_recovery_code("abcde-23456");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_recovery_code("abcde-23456"));
        assert_ne!(hash, hash_recovery_code("abcde-23457"));
    }
}
