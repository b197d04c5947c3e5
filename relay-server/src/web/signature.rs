//! Kiosk webhook signature verification.
//!
//! The kiosk signs webhook requests with HMAC-SHA256 over the raw request
//! body and sends the digest in the `X-Kiosk-Signature-256` header as
//! `sha256=<hex digest>`. Verification runs over the raw bytes, never a
//! re-serialized body, so encoding differences cannot desynchronize the
//! signature from the content.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Verify a kiosk webhook signature.
///
/// # Arguments
///
/// * `payload_body` - The raw request payload body
/// * `secret` - The shared secret the sender signed the payload with
/// * `signature_header` - The `X-Kiosk-Signature-256` header value, if any
///
/// # Returns
///
/// `true` only if the header carries the expected `sha256=<hex>` digest of
/// the body. An absent or empty header is `false`.
pub fn verify_signature(
    payload_body: &[u8],
    secret: &str,
    signature_header: Option<&str>,
) -> bool {
    let signature = match signature_header {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!("kiosk_signature_missing");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("kiosk_signature_invalid_key");
            return false;
        }
    };

    mac.update(payload_body);

    let expected_signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected_signature, signature);

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "kiosk_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
