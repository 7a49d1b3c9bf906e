//! Saleor webhook signature verification using HMAC-SHA256.
//!
//! Saleor signs each delivery with the secret key the app supplied when it
//! created the webhook. The signature arrives in the `Saleor-Signature` header
//! (legacy: `X-Saleor-Signature`) as the hex-encoded HMAC-SHA256 of the raw
//! body. A `sha256=` prefix is tolerated.
//!
//! Verification runs on the exact bytes received, before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a signature header value into raw bytes.
///
/// Returns `None` for anything that is not hex (optionally `sha256=`-prefixed).
/// Never panics.
///
/// # Examples
///
/// ```
/// use saleor_app::webhooks::parse_signature_header;
///
/// assert!(parse_signature_header("abcd1234").is_some());
/// assert!(parse_signature_header("sha256=abcd1234").is_some());
/// assert!(parse_signature_header("sha1=abcd1234").is_none());
/// assert!(parse_signature_header("xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.trim();
    let hex_sig = hex_sig.strip_prefix("sha256=").unwrap_or(hex_sig);
    if hex_sig.is_empty() {
        return None;
    }
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 of a payload keyed by `secret`.
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature the way Saleor sends it: lowercase hex.
pub fn format_signature_header(signature: &[u8]) -> String {
    hex::encode(signature)
}

/// Verifies a presented signature against the payload and secret.
///
/// Returns `true` only if the signature is well-formed and matches. The
/// comparison is constant-time. A malformed signature is treated exactly like
/// a wrong one.
///
/// # Examples
///
/// ```
/// use saleor_app::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"order":{"id":"T3JkZXI6MQ=="}}"#;
/// let header = format_signature_header(&compute_signature(b"secret", body));
///
/// assert!(verify_signature(b"secret", body, &header));
/// assert!(!verify_signature(b"other", body, &header));
/// ```
pub fn verify_signature(secret: &[u8], payload: &[u8], signature_header: &str) -> bool {
    let Some(presented) = parse_signature_header(signature_header) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    mac.verify_slice(&presented).is_ok()
}
