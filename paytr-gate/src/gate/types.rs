//! Inputs and verdicts of the verification gate.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

/// Form field carrying the provider's signature.
pub const SIGNATURE_FIELD: &str = "hash";

/// Form field carrying the merchant order id.
pub const BUSINESS_ID_FIELD: &str = "merchant_oid";

/// One inbound notification, as received.
#[derive(Debug, Clone, Default)]
pub struct IncomingEvent {
    /// Request body exactly as it arrived on the wire
    pub raw: Vec<u8>,
    /// Decoded form fields
    pub fields: HashMap<String, String>,
    /// Signature from the `X-Paytr-Hash` header, if any
    pub alt_signature: Option<String>,
}

impl IncomingEvent {
    /// Build an event from an `application/x-www-form-urlencoded` body.
    ///
    /// The raw bytes are kept untouched for fingerprinting. When a key is
    /// repeated the last value wins.
    pub fn from_urlencoded(raw: impl Into<Vec<u8>>, alt_signature: Option<String>) -> Self {
        let raw = raw.into();
        let fields = url::form_urlencoded::parse(&raw).into_owned().collect();

        Self {
            raw,
            fields,
            alt_signature,
        }
    }

    /// Signature from the `hash` field, falling back to the header.
    ///
    /// Empty values count as absent.
    pub fn provided_signature(&self) -> Option<&str> {
        self.fields
            .get(SIGNATURE_FIELD)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| self.alt_signature.as_deref().filter(|s| !s.is_empty()))
    }

    /// Merchant order id, or an empty string.
    pub fn business_id(&self) -> &str {
        self.fields
            .get(BUSINESS_ID_FIELD)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A notification that passed every check.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedEvent {
    pub valid: bool,
    pub payload: HashMap<String, String>,
    pub fingerprint: String,
    #[serde(rename = "merchant_oid")]
    pub business_id: String,
}

/// Why a notification was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Merchant key or salt is not configured
    #[error("misconfigured")]
    Misconfigured,
    /// Neither the `hash` field nor the header carried a signature
    #[error("missing_signature")]
    MissingSignature,
    /// Signature did not match, or could not be computed
    #[error("bad_signature")]
    BadSignature,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Misconfigured => "misconfigured",
            RejectReason::MissingSignature => "missing_signature",
            RejectReason::BadSignature => "bad_signature",
        }
    }

    /// Operational faults, as opposed to a bad request from the caller.
    pub fn is_operational(&self) -> bool {
        matches!(self, RejectReason::Misconfigured)
    }
}

/// Which duplicate check caught a signed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    BusinessId,
    Fingerprint,
}

impl DuplicateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateReason::BusinessId => "duplicate_business_id",
            DuplicateReason::Fingerprint => "duplicate_fingerprint",
        }
    }

    /// Acknowledgement body returned to the provider.
    pub fn ack_body(&self) -> &'static str {
        match self {
            DuplicateReason::BusinessId => "duplicate-oid",
            DuplicateReason::Fingerprint => "duplicate",
        }
    }
}

/// Outcome of running a notification through the gate.
#[derive(Debug, Clone)]
pub enum Verdict {
    Admit(VerifiedEvent),
    Duplicate(DuplicateReason),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit(_))
    }
}
