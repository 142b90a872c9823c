//! Cryptographic utilities for webhook verification.
//!
//! Shared functions for verifying the WhatsApp `X-Hub-Signature-256`
//! header and the shared secret on payment callbacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// # Panics
///
/// This function will never panic in practice. The `expect` call is guarded by
/// the invariant that HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    let result = mac.finalize();

    hex::encode(result.into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify a WhatsApp `X-Hub-Signature-256` header against a raw body.
///
/// The header value has the form `sha256=<hex digest>`.
#[must_use]
pub fn verify_hub_signature(app_secret: &str, body: &str, header: &str) -> bool {
    let Some(received) = header.strip_prefix("sha256=") else {
        return false;
    };
    let expected = hmac_sha256_hex(app_secret, body);
    constant_time_eq(&expected, received)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha256_produces_correct_length() {
        let result = hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog");
        assert_eq!(result.len(), 64); // SHA256 = 32 bytes = 64 hex chars
    }

    #[test]
    fn hmac_sha256_is_deterministic() {
        let result1 = hmac_sha256_hex("secret", "message");
        let result2 = hmac_sha256_hex("secret", "message");
        assert_eq!(result1, result2);
    }

    #[test]
    fn constant_time_eq_equal_strings() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn constant_time_eq_different_strings() {
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "ABC"));
    }

    #[test]
    fn hub_signature_roundtrip() {
        let body = r#"{"object":"whatsapp_business_account"}"#;
        let header = format!("sha256={}", hmac_sha256_hex("app-secret", body));

        assert!(verify_hub_signature("app-secret", body, &header));
        assert!(!verify_hub_signature("other-secret", body, &header));
        assert!(!verify_hub_signature("app-secret", body, "sha256=dead"));
        assert!(!verify_hub_signature("app-secret", body, "no-prefix"));
    }
}
