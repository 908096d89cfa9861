//! PayTR notification signing and timing-safe comparison.
//!
//! PayTR signs notifications with HMAC-SHA256 over the canonical string and
//! sends the digest base64-encoded in the `hash` field.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Failures while computing a signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid HMAC key length")]
    InvalidKey,
}

/// Compute the base64-encoded HMAC-SHA256 of `data` under `key`.
pub fn sign(data: &str, key: &str) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(data.as_bytes());

    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Compare two signatures without leaking where they differ.
///
/// Inputs of different length are unequal; only the length check itself
/// short-circuits.
pub fn safe_equals(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}
