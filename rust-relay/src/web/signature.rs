//! Smartlead webhook signature verification.
//!
//! Smartlead signs the raw request body with HMAC-SHA256 keyed by the
//! shared webhook secret and sends the hex digest in a request header.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Smartlead-Signature";

/// Verify a Smartlead webhook signature.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `body` - The raw request body, exactly as received
/// * `signature` - Hex digest from the signature header, optionally prefixed
///   with `sha256=`
///
/// # Returns
///
/// `Ok(())` if the digest matches. Comparison is constant-time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<(), AuthError> {
    let signature = signature.trim();

    if signature.is_empty() {
        warn!("smartlead_signature_missing");
        return Err(AuthError::MissingSignature);
    }

    if secret.is_empty() {
        warn!("smartlead_secret_not_configured");
        return Err(AuthError::InvalidSignature);
    }

    let digest = signature.strip_prefix("sha256=").unwrap_or(signature);

    let provided = hex::decode(digest).map_err(|_| {
        warn!(signature_length = signature.len(), "smartlead_signature_malformed");
        AuthError::MalformedSignature
    })?;

    let mut mac = keyed_mac(secret)?;
    mac.update(body);

    mac.verify_slice(&provided).map_err(|_| {
        warn!(
            body_length = body.len(),
            provided_length = provided.len(),
            "smartlead_signature_mismatch"
        );
        AuthError::InvalidSignature
    })
}

/// Compute the lowercase hex signature Smartlead would send for `body`.
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String, AuthError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn keyed_mac(secret: &str) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        warn!("smartlead_signature_invalid_key");
        AuthError::InvalidSignature
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"event":"EMAIL_OPENED","campaign":"camp_123"}"#;

    #[test]
    fn test_verify_signature_valid() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        assert_eq!(verify_signature(SECRET, BODY, &signature), Ok(()));
    }

    #[test]
    fn test_verify_signature_known_vector() {
        // RFC 4231 test case 2
        let signature = compute_signature("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_signature_accepts_prefix_and_uppercase() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        let prefixed = format!("sha256={}", signature);
        assert_eq!(verify_signature(SECRET, BODY, &prefixed), Ok(()));
        assert_eq!(
            verify_signature(SECRET, BODY, &signature.to_uppercase()),
            Ok(())
        );
    }

    #[test]
    fn test_verify_signature_missing() {
        assert_eq!(
            verify_signature(SECRET, BODY, ""),
            Err(AuthError::MissingSignature)
        );
        assert_eq!(
            verify_signature(SECRET, BODY, "   "),
            Err(AuthError::MissingSignature)
        );
    }

    #[test]
    fn test_verify_signature_malformed() {
        assert_eq!(
            verify_signature(SECRET, BODY, "not-hex"),
            Err(AuthError::MalformedSignature)
        );
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let signature = compute_signature("other-secret", BODY).unwrap();
        assert_eq!(
            verify_signature(SECRET, BODY, &signature),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_signature_tampered_body() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        let tampered = br#"{"event":"EMAIL_OPENED","campaign":"camp_124"}"#;
        assert_eq!(
            verify_signature(SECRET, tampered, &signature),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_signature_truncated_digest() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        assert_eq!(
            verify_signature(SECRET, BODY, &signature[..32]),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_signature_empty_secret() {
        let signature = compute_signature("", BODY).unwrap();
        assert_eq!(
            verify_signature("", BODY, &signature),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_compute_signature_any_key_length() {
        let long_key = "k".repeat(512);
        for secret in ["", "x", long_key.as_str()] {
            let signature = compute_signature(secret, BODY).unwrap();
            assert_eq!(signature.len(), 64);
            assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
