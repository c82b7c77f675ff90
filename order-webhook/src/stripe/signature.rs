//! Stripe webhook signature verification.
//!
//! Stripe signs each delivery with HMAC-SHA256 and sends the result in the
//! `Stripe-Signature` header:
//!
//! ```text
//! Stripe-Signature: t=1492774577,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! The signed payload is `"{t}.{raw_body}"`. Reference:
//! https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a delivery fails verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header has no timestamp")]
    MissingTimestamp,
    #[error("signature header timestamp is not a number: {0}")]
    InvalidTimestamp(String),
    #[error("signature header has no v1 signatures")]
    NoSignatures,
    #[error("timestamp outside tolerance ({age_seconds}s old, max {max_age_seconds}s)")]
    Stale {
        age_seconds: u64,
        max_age_seconds: u64,
    },
    #[error("no signature matches the payload")]
    Mismatch,
    #[error("webhook secret is empty")]
    EmptySecret,
}

/// Parsed `Stripe-Signature` header.
#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader<'a> {
    timestamp: u64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            "t" => timestamp = Some(value.trim()),
            "v1" => signatures.push(value.trim()),
            // v0 and unknown schemes are ignored
            _ => {}
        }
    }

    let raw_timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    let timestamp = raw_timestamp
        .parse::<u64>()
        .map_err(|_| SignatureError::InvalidTimestamp(raw_timestamp.to_string()))?;

    if signatures.is_empty() {
        return Err(SignatureError::NoSignatures);
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_signature(secret: &str, timestamp: u64, payload: &[u8]) -> Result<String, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::EmptySecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a Stripe webhook delivery against the current clock.
///
/// # Arguments
///
/// * `payload` - The raw, unmodified request body
/// * `header` - The `Stripe-Signature` header value
/// * `secret` - The endpoint's signing secret
/// * `tolerance_seconds` - Maximum allowed age of the timestamp (prevents replay attacks)
pub fn verify_stripe_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_seconds: u64,
) -> Result<(), SignatureError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    verify_stripe_signature_at(payload, header, secret, tolerance_seconds, now)
}

/// Verify a delivery against an explicit `now` (unix seconds).
pub fn verify_stripe_signature_at(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_seconds: u64,
    now: u64,
) -> Result<(), SignatureError> {
    let parsed = parse_header(header).inspect_err(|e| {
        warn!(error = %e, "stripe_signature_header_invalid");
    })?;

    // Only old timestamps are rejected; clock skew ahead of us is tolerated
    let age = now.saturating_sub(parsed.timestamp);
    if age > tolerance_seconds {
        warn!(
            webhook_time = parsed.timestamp,
            current_time = now,
            age_seconds = age,
            max_age_seconds = tolerance_seconds,
            "stripe_signature_stale"
        );
        return Err(SignatureError::Stale {
            age_seconds: age,
            max_age_seconds: tolerance_seconds,
        });
    }

    let expected = compute_signature(secret, parsed.timestamp, payload)?;

    // Stripe sends several v1 entries while a secret is being rolled
    let valid = parsed
        .signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate));

    if !valid {
        warn!(
            candidates = parsed.signatures.len(),
            "stripe_signature_mismatch"
        );
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

/// Build a valid `Stripe-Signature` header for `payload`.
///
/// Used to forge deliveries for local testing.
pub fn sign(secret: &str, timestamp: u64, payload: &[u8]) -> Result<String, SignatureError> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, signature))
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

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: u64 = 1_717_000_000;
    const BODY: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

    #[test]
    fn test_parse_header_multiple_signatures() {
        let parsed = parse_header("t=123, v1=abc,v0=old,v1=def").unwrap();
        assert_eq!(parsed.timestamp, 123);
        assert_eq!(parsed.signatures, vec!["abc", "def"]);
    }

    #[test]
    fn test_parse_header_missing_parts() {
        assert_eq!(parse_header("v1=abc"), Err(SignatureError::MissingTimestamp));
        assert_eq!(parse_header("t=123"), Err(SignatureError::NoSignatures));
        assert_eq!(
            parse_header("t=soon,v1=abc"),
            Err(SignatureError::InvalidTimestamp("soon".to_string()))
        );
        assert_eq!(parse_header("garbage"), Err(SignatureError::MissingTimestamp));
    }

    #[test]
    fn test_verify_signature_valid() {
        let header = sign(SECRET, NOW, BODY).unwrap();
        assert_eq!(
            verify_stripe_signature_at(BODY, &header, SECRET, 300, NOW + 10),
            Ok(())
        );
    }

    #[test]
    fn test_verify_signature_rolled_secret() {
        let good = compute_signature(SECRET, NOW, BODY).unwrap();
        let header = format!("t={},v1={},v1={}", NOW, "0".repeat(64), good);
        assert!(verify_stripe_signature_at(BODY, &header, SECRET, 300, NOW).is_ok());
    }

    #[test]
    fn test_verify_signature_tampered_body() {
        let header = sign(SECRET, NOW, BODY).unwrap();
        let tampered = br#"{"id":"evt_1","type":"checkout.session.expired"}"#;
        assert_eq!(
            verify_stripe_signature_at(tampered, &header, SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let header = sign("whsec_other", NOW, BODY).unwrap();
        assert_eq!(
            verify_stripe_signature_at(BODY, &header, SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_stale() {
        let header = sign(SECRET, NOW, BODY).unwrap();
        assert_eq!(
            verify_stripe_signature_at(BODY, &header, SECRET, 300, NOW + 301),
            Err(SignatureError::Stale {
                age_seconds: 301,
                max_age_seconds: 300,
            })
        );
    }

    #[test]
    fn test_verify_signature_future_timestamp_accepted() {
        let header = sign(SECRET, NOW + 60, BODY).unwrap();
        assert!(verify_stripe_signature_at(BODY, &header, SECRET, 300, NOW).is_ok());

        let header = sign(SECRET, NOW + 10_000, BODY).unwrap();
        assert_eq!(
            verify_stripe_signature_at(BODY, &header, SECRET, 300, NOW),
            Ok(())
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(sign("", NOW, BODY), Err(SignatureError::EmptySecret));
        let header = sign(SECRET, NOW, BODY).unwrap();
        assert_eq!(
            verify_stripe_signature_at(BODY, &header, "", 300, NOW),
            Err(SignatureError::EmptySecret)
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
