//! Payment gateway webhook signatures
//!
//! The gateway signs the raw request body with HMAC-SHA256 over the shared
//! secret and sends the lowercase hex digest, optionally prefixed `sha256=`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Hex HMAC-SHA256 of `payload`. `None` only if the key is rejected.
pub fn sign_payload(secret: &str, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of `signature` against the expected digest.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let provided = signature.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    let Some(expected) = sign_payload(secret, payload) else {
        return false;
    };
    expected
        .as_bytes()
        .ct_eq(provided.to_ascii_lowercase().as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_0123456789abcdef0123456789abcdef";

    #[test]
    fn test_signature_accepts_own_digest() {
        let body = br#"{"invoice_id":"00000000-0000-0000-0000-000000000000"}"#;
        let sig = sign_payload(SECRET, body).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_signature(SECRET, body, &sig));
        assert!(verify_signature(SECRET, body, &format!("sha256={}", sig)));
        assert!(verify_signature(SECRET, body, &sig.to_uppercase()));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let sig = sign_payload(SECRET, b"original").unwrap();
        assert!(!verify_signature(SECRET, b"tampered", &sig));
        assert!(!verify_signature("another-secret", b"original", &sig));
        assert!(!verify_signature(SECRET, b"original", ""));
    }
}
