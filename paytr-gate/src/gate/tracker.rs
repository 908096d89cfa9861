//! Two-tier duplicate suppression.
//!
//! Merchant order ids are remembered forever, so a retried notification for
//! an order that was already admitted is never processed twice. Raw payload
//! fingerprints are remembered for a replay window only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::gate::store::{InMemorySeenStore, SeenStore};

/// Default replay window for raw payload fingerprints.
pub const REPLAY_WINDOW: Duration = Duration::from_secs(5 * 60);

/// SHA-256 hex digest of the raw request body.
pub fn fingerprint(raw: &[u8]) -> String {
    hex::encode(Sha256::digest(raw))
}

/// Recency maps keyed by business id and by payload fingerprint.
#[derive(Debug, Clone)]
pub struct DuplicateTracker {
    by_business_id: Arc<dyn SeenStore>,
    by_fingerprint: Arc<dyn SeenStore>,
}

impl Default for DuplicateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateTracker {
    /// Tracker with two fresh in-memory stores.
    pub fn new() -> Self {
        Self::with_stores(
            Arc::new(InMemorySeenStore::new()),
            Arc::new(InMemorySeenStore::new()),
        )
    }

    pub fn with_stores(
        by_business_id: Arc<dyn SeenStore>,
        by_fingerprint: Arc<dyn SeenStore>,
    ) -> Self {
        Self {
            by_business_id,
            by_fingerprint,
        }
    }

    /// Returns `true` if `id` has never been seen. Empty ids are not tracked.
    pub fn check_and_record_business_id(&self, id: &str, now: Instant) -> bool {
        if id.is_empty() {
            return true;
        }
        self.by_business_id.check_and_record(id, now, None)
    }

    /// Returns `true` if `fp` was not seen within `window` before `now`.
    pub fn check_and_record_fingerprint(&self, fp: &str, now: Instant, window: Duration) -> bool {
        self.by_fingerprint.check_and_record(fp, now, Some(window))
    }

    /// Evict fingerprints older than `window`. Business ids are kept.
    pub fn sweep_expired_fingerprints(&self, now: Instant, window: Duration) -> usize {
        let removed = self.by_fingerprint.evict_older_than(now, window);
        debug!(
            removed = removed,
            remaining = self.by_fingerprint.len(),
            "fingerprint_sweep"
        );
        removed
    }

    pub fn tracked_business_ids(&self) -> usize {
        self.by_business_id.len()
    }

    pub fn tracked_fingerprints(&self) -> usize {
        self.by_fingerprint.len()
    }
}
