//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery with the shared webhook secret and sends the
//! result in `X-Hub-Signature-256` as `sha256=<hex>`. Verification runs before
//! the body is decoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a `sha256=<hex>` header value into raw bytes.
///
/// Returns `None` for a missing prefix, another algorithm, or bad hex.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Verifies `signature_header` against the payload and secret.
///
/// The comparison is constant-time.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Signs a payload the way GitHub does, returning the full header value.
#[cfg(test)]
pub(crate) fn sign(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any size");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
