//! Slack request signing (`X-Slack-Signature`, version `v0`).
//!
//! The signature is `v0=` followed by the hex HMAC-SHA256 of
//! `v0:{timestamp}:{raw body}` keyed with the app's signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_VERSION: &str = "v0";
/// Requests older (or newer) than this are treated as replays.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60 * 5;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing request timestamp header")]
    MissingTimestamp,
    #[error("request timestamp `{0}` is not a unix timestamp")]
    InvalidTimestamp(String),
    #[error("request timestamp is {skew_secs}s away from server time")]
    StaleTimestamp { skew_secs: i64 },
    #[error("missing request signature header")]
    MissingSignature,
    #[error("request signature does not match")]
    Mismatch,
}

pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length.
        Err(_) => return String::new(),
    };
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    format!("{SIGNATURE_VERSION}={}", encode_hex(mac.finalize().into_bytes().as_slice()))
}

pub fn verify(
    secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now_unix: i64,
) -> Result<(), SignatureError> {
    let timestamp = timestamp.map(str::trim).ok_or(SignatureError::MissingTimestamp)?;
    let sent_at = timestamp
        .parse::<i64>()
        .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_owned()))?;
    let skew_secs = now_unix.saturating_sub(sent_at);
    if skew_secs.abs() > MAX_CLOCK_SKEW_SECS {
        return Err(SignatureError::StaleTimestamp { skew_secs });
    }

    let signature = signature.map(str::trim).ok_or(SignatureError::MissingSignature)?;
    let expected = sign(secret, timestamp, body);
    if expected.is_empty() || !constant_time_eq(&expected, signature) {
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
