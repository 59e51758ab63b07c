//! Stripe webhook signature verification.
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 and sends the
//! result in the `Stripe-Signature` header as `t=<unix>,v1=<hex>`. Several
//! `v1` entries may be present while a secret is being rolled.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the Stripe signature
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

const SIGNATURE_SCHEME: &str = "v1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    MissingHeader,

    #[error("invalid signature format: {0}")]
    InvalidFormat(String),

    #[error("timestamp {timestamp} is outside the {tolerance}s tolerance")]
    TimestampOutsideTolerance { timestamp: i64, tolerance: i64 },

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid secret key")]
    InvalidSecret,
}

/// Parsed `Stripe-Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    /// Parses `t=<unix>,v1=<hex>[,v1=<hex>...]`, ignoring other schemes
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        if header.trim().is_empty() {
            return Err(SignatureError::MissingHeader);
        }

        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let (key, value) = item.trim().split_once('=').ok_or_else(|| {
                SignatureError::InvalidFormat(format!("expected key=value, got: {item}"))
            })?;
            match key {
                "t" => {
                    let parsed = value.parse::<i64>().map_err(|_| {
                        SignatureError::InvalidFormat(format!("invalid timestamp: {value}"))
                    })?;
                    timestamp = Some(parsed);
                }
                SIGNATURE_SCHEME => signatures.push(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| SignatureError::InvalidFormat("missing timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(SignatureError::InvalidFormat(format!(
                "no {SIGNATURE_SCHEME} signatures found"
            )));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Generates the hex HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn compute_signature(
    payload: &[u8],
    timestamp: i64,
    secret: &str,
) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a raw webhook payload against its `Stripe-Signature` header
///
/// # Arguments
/// * `payload` - Request body exactly as received
/// * `header` - Value of the `Stripe-Signature` header
/// * `secret` - Endpoint signing secret
/// * `now` - Current unix time in seconds
/// * `tolerance` - Maximum allowed distance between `now` and the signed timestamp
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance: i64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::InvalidSecret);
    }

    let header = SignatureHeader::parse(header)?;
    let expected = compute_signature(payload, header.timestamp, secret)?;

    if !header
        .signatures
        .iter()
        .any(|candidate| timing_safe_eq(candidate, &expected))
    {
        return Err(SignatureError::VerificationFailed);
    }

    // A negative tolerance accepts only an exact match
    let max_skew = u64::try_from(tolerance).unwrap_or(0);
    if now.abs_diff(header.timestamp) > max_skew {
        return Err(SignatureError::TimestampOutsideTolerance {
            timestamp: header.timestamp,
            tolerance,
        });
    }

    Ok(())
}

/// Builds a header value for `payload`, used by clients replaying events and by tests
pub fn sign_payload(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, SignatureError> {
    let signature = compute_signature(payload, timestamp, secret)?;
    Ok(format!("t={timestamp},{SIGNATURE_SCHEME}={signature}"))
}

fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
