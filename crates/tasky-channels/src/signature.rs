//! Webhook payload signature verification.
//!
//! The platform signs each delivery with HMAC-SHA256 over the raw request
//! body under the app secret, hex-encoded in the `x-hub-signature-256`
//! header. Verification fails closed: missing header, empty secret, or any
//! computation error all return `false`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook signature against the raw request body.
///
/// A `sha256=` algorithm prefix on the header is stripped before comparison.
pub fn verify_signature(
    raw_body: &[u8],
    signature_header: Option<&str>,
    app_secret: &str,
) -> bool {
    let header = match signature_header {
        Some(h) if !h.is_empty() => h,
        _ => return false,
    };
    if app_secret.is_empty() {
        return false;
    }

    let signature = header.strip_prefix("sha256=").unwrap_or(header);

    let mut mac = match HmacSha256::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(raw_body);
    let expected = hex::encode(mac.finalize().into_bytes());

    constant_time_eq(&expected, signature)
}

/// Constant-time string comparison to prevent timing attacks on signature checks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
