//! The verification gate.
//!
//! Checks run in a fixed order and stop at the first failure:
//! configuration, signature presence, signature match, business id, then
//! payload fingerprint. Nothing is recorded until the signature has been
//! verified.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::gate::canonical::build_canonical_string;
use crate::gate::clock::{Clock, SystemClock};
use crate::gate::signature::{safe_equals, sign};
use crate::gate::tracker::{fingerprint, DuplicateTracker, REPLAY_WINDOW};
use crate::gate::types::{DuplicateReason, IncomingEvent, RejectReason, Verdict, VerifiedEvent};

/// Merchant key and salt issued by PayTR.
#[derive(Clone)]
pub struct MerchantSecrets {
    pub key: String,
    pub salt: String,
}

impl std::fmt::Debug for MerchantSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchantSecrets").finish_non_exhaustive()
    }
}

/// Admits, rejects or de-duplicates PayTR notifications.
#[derive(Debug, Clone)]
pub struct Gate {
    secrets: Option<MerchantSecrets>,
    field_order: Vec<String>,
    replay_window: Duration,
    tracker: DuplicateTracker,
    clock: Arc<dyn Clock>,
}

impl Gate {
    /// Create a gate with fresh in-memory duplicate tracking.
    ///
    /// `secrets = None` yields a gate that rejects everything as
    /// misconfigured.
    pub fn new(secrets: Option<MerchantSecrets>, field_order: Vec<String>) -> Self {
        Self {
            secrets,
            field_order,
            replay_window: REPLAY_WINDOW,
            tracker: DuplicateTracker::new(),
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let secrets = match (&config.merchant_key, &config.merchant_salt) {
            (Some(key), Some(salt)) => Some(MerchantSecrets {
                key: key.clone(),
                salt: salt.clone(),
            }),
            _ => None,
        };

        Self::new(secrets, config.hash_field_order.clone())
            .with_replay_window(config.replay_window)
    }

    /// Override the replay window. A zero window is ignored.
    pub fn with_replay_window(mut self, window: Duration) -> Self {
        if window.is_zero() {
            warn!("paytr_replay_window_zero_ignored");
        } else {
            self.replay_window = window;
        }
        self
    }

    pub fn with_tracker(mut self, tracker: DuplicateTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tracker(&self) -> &DuplicateTracker {
        &self.tracker
    }

    /// Run `event` through every check and return the verdict.
    pub fn evaluate(&self, event: &IncomingEvent) -> Verdict {
        let Some(secrets) = self.secrets.as_ref() else {
            error!("paytr_gate_misconfigured");
            return Verdict::Reject(RejectReason::Misconfigured);
        };

        let Some(provided) = event.provided_signature() else {
            warn!(
                has_alt_header = event.alt_signature.is_some(),
                "paytr_signature_missing"
            );
            return Verdict::Reject(RejectReason::MissingSignature);
        };

        if !self.signature_matches(secrets, event, provided) {
            return Verdict::Reject(RejectReason::BadSignature);
        }

        let business_id = event.business_id();
        let now = self.clock.now();

        if !self.tracker.check_and_record_business_id(business_id, now) {
            info!(merchant_oid = %business_id, "paytr_duplicate_business_id");
            return Verdict::Duplicate(DuplicateReason::BusinessId);
        }

        let fp = fingerprint(&event.raw);
        if !self
            .tracker
            .check_and_record_fingerprint(&fp, now, self.replay_window)
        {
            info!(
                merchant_oid = %business_id,
                fingerprint = %fp,
                "paytr_duplicate_fingerprint"
            );
            return Verdict::Duplicate(DuplicateReason::Fingerprint);
        }

        debug!(merchant_oid = %business_id, fingerprint = %fp, "paytr_admitted");

        Verdict::Admit(VerifiedEvent {
            valid: true,
            payload: event.fields.clone(),
            fingerprint: fp,
            business_id: business_id.to_string(),
        })
    }

    /// Evict fingerprints that fell out of the replay window.
    pub fn sweep_expired(&self) -> usize {
        self.tracker
            .sweep_expired_fingerprints(self.clock.now(), self.replay_window)
    }

    fn signature_matches(
        &self,
        secrets: &MerchantSecrets,
        event: &IncomingEvent,
        provided: &str,
    ) -> bool {
        let canonical = build_canonical_string(&event.fields, &secrets.salt, &self.field_order);

        let expected = match sign(&canonical, &secrets.key) {
            Ok(sig) => sig,
            Err(e) => {
                error!(error = %e, "paytr_signature_compute_failed");
                return false;
            }
        };

        let valid = safe_equals(&expected, provided);
        if !valid {
            warn!(
                expected_length = expected.len(),
                actual_length = provided.len(),
                merchant_oid = %event.business_id(),
                "paytr_signature_mismatch"
            );
        }

        valid
    }
}
