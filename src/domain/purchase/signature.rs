//! Webhook signature primitives shared by all provider adapters.
//!
//! Every scheme reduces to HMAC-SHA256 over some framing of the exact
//! request bytes, compared in constant time. Framing and header parsing
//! stay with each adapter.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age for timestamped signatures (5 minutes).
pub const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for timestamps in the future (1 minute).
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Tolerance applied in both directions by Standard Webhooks (5 minutes).
pub const STANDARD_WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Computes HMAC-SHA256 over the concatenation of `parts`.
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| WebhookError::Configuration(format!("unusable signing key: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Verifies a bare hex-encoded HMAC-SHA256 of the body.
///
/// Used by platforms that sign the raw body with no framing.
pub fn verify_hex_body_signature(
    secret: &[u8],
    body: &[u8],
    provided_hex: &str,
) -> Result<(), WebhookError> {
    let provided = hex::decode(provided_hex.trim())
        .map_err(|_| WebhookError::MissingSignature("signature is not valid hex"))?;
    let expected = hmac_sha256(secret, &[body])?;

    if !constant_time_eq(&expected, &provided) {
        return Err(WebhookError::InvalidSignature);
    }
    Ok(())
}

/// Rejects timestamps older than [`MAX_EVENT_AGE_SECS`] or further than
/// [`MAX_CLOCK_SKEW_SECS`] in the future, relative to `now`.
pub fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;

    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    Ok(())
}

/// Rejects timestamps more than `tolerance` seconds away from `now`, in
/// either direction.
pub fn validate_timestamp_symmetric(
    timestamp: i64,
    now: i64,
    tolerance: i64,
) -> Result<(), WebhookError> {
    if (now - timestamp).abs() > tolerance {
        return Err(WebhookError::TimestampOutOfRange);
    }
    Ok(())
}
