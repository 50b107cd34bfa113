use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Maximum accepted distance between the delivery timestamp and the server
/// clock. Deliveries outside the window are treated as replays.
pub const TIMESTAMP_TOLERANCE_MS: i64 = 60_000;

/// Authentication failures raised while checking a delivery signature.
/// Every missing precondition is an error; nothing passes through unsigned.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("webhook secret is not configured")]
    MissingSecret,
    #[error("signature is not valid hex")]
    InvalidHex,
    #[error("signature mismatch")]
    Mismatch,
    #[error("payload is missing the webhook timestamp field")]
    MissingTimestamp,
    #[error("webhook timestamp outside the allowed window")]
    StaleTimestamp,
}

/// Verifies that `signature` is the HMAC-SHA256 hex digest of `raw_body`
/// under `secret`, and that the delivery timestamp (epoch milliseconds,
/// read from the payload before verification but acted upon only here) is
/// within [`TIMESTAMP_TOLERANCE_MS`] of `now`.
///
/// Runs strictly before the payload shape is interpreted; the caller hands
/// over the raw bytes untouched.
pub fn verify_signature(
    secret: &[u8],
    raw_body: &[u8],
    signature: &str,
    timestamp_ms: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }

    let provided = hex::decode(signature.trim()).map_err(|_| SignatureError::InvalidHex)?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).map_err(|_| SignatureError::MissingSecret)?;
    mac.update(raw_body);
    let expected = mac.finalize().into_bytes();

    if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        return Err(SignatureError::Mismatch);
    }

    let timestamp_ms = timestamp_ms.ok_or(SignatureError::MissingTimestamp)?;
    let skew = (now.timestamp_millis() - timestamp_ms).abs();
    if skew > TIMESTAMP_TOLERANCE_MS {
        return Err(SignatureError::StaleTimestamp);
    }

    Ok(())
}
