//! Shared memory of already-seen keys.
//!
//! [`SeenStore`] is the seam the duplicate tracker is built on. The
//! in-process implementation keeps entries in a [`DashMap`]; a deployment
//! that needs business ids to survive restarts can put a durable store
//! behind the same trait.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Key-value store of first-seen timestamps with atomic check-and-record.
pub trait SeenStore: Send + Sync + Debug {
    /// Record `key` at `now` unless it was already seen.
    ///
    /// With `window = None` an entry never expires. With `Some(window)` an
    /// entry older than `window` is treated as absent and overwritten.
    /// Returns `true` when the key is fresh. A key that is still live keeps
    /// its original timestamp. Two concurrent callers with the same key can
    /// never both get `true`.
    fn check_and_record(&self, key: &str, now: Instant, window: Option<Duration>) -> bool;

    /// Drop every entry whose age at `now` is at least `window`.
    ///
    /// Returns the number of entries removed.
    fn evict_older_than(&self, now: Instant, window: Duration) -> usize;

    /// Number of tracked keys.
    fn len(&self) -> usize;
}

/// In-process [`SeenStore`] backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySeenStore {
    seen: DashMap<String, Instant>,
}

impl InMemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_live(seen_at: Instant, now: Instant, window: Option<Duration>) -> bool {
    match window {
        None => true,
        Some(window) => now.saturating_duration_since(seen_at) < window,
    }
}

impl SeenStore for InMemorySeenStore {
    fn check_and_record(&self, key: &str, now: Instant, window: Option<Duration>) -> bool {
        // The entry guard holds the shard lock for the whole check-then-record.
        match self.seen.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if is_live(*occupied.get(), now, window) {
                    false
                } else {
                    occupied.insert(now);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            }
        }
    }

    fn evict_older_than(&self, now: Instant, window: Duration) -> usize {
        let before = self.seen.len();
        self.seen
            .retain(|_, seen_at| is_live(*seen_at, now, Some(window)));
        before.saturating_sub(self.seen.len())
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    const WINDOW: Duration = Duration::from_secs(300);

    #[test]
    fn test_first_sighting_is_fresh() {
        let store = InMemorySeenStore::new();
        let now = Instant::now();

        assert!(store.check_and_record("a", now, None));
        assert!(!store.check_and_record("a", now, None));
        assert!(store.check_and_record("b", now, None));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_permanent_entries_never_expire() {
        let store = InMemorySeenStore::new();
        let start = Instant::now();

        assert!(store.check_and_record("oid", start, None));
        let much_later = start + Duration::from_secs(60 * 60 * 24 * 365);
        assert!(!store.check_and_record("oid", much_later, None));
    }

    #[test]
    fn test_windowed_entry_expires() {
        let store = InMemorySeenStore::new();
        let start = Instant::now();

        assert!(store.check_and_record("fp", start, Some(WINDOW)));
        assert!(!store.check_and_record("fp", start + Duration::from_secs(299), Some(WINDOW)));
        // exactly at the window boundary the entry is stale
        assert!(store.check_and_record("fp", start + WINDOW, Some(WINDOW)));
    }

    #[test]
    fn test_duplicate_does_not_refresh_timestamp() {
        let store = InMemorySeenStore::new();
        let start = Instant::now();

        assert!(store.check_and_record("fp", start, Some(WINDOW)));
        assert!(!store.check_and_record("fp", start + Duration::from_secs(200), Some(WINDOW)));
        // measured from the first sighting, not the duplicate
        assert!(store.check_and_record("fp", start + Duration::from_secs(301), Some(WINDOW)));
    }

    #[test]
    fn test_evict_older_than() {
        let store = InMemorySeenStore::new();
        let start = Instant::now();

        store.check_and_record("old", start, Some(WINDOW));
        store.check_and_record("new", start + Duration::from_secs(200), Some(WINDOW));

        let removed = store.evict_older_than(start + Duration::from_secs(350), WINDOW);

        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(!store.check_and_record("new", start + Duration::from_secs(350), Some(WINDOW)));
    }

    #[test]
    fn test_concurrent_same_key_single_winner() {
        let store = Arc::new(InMemorySeenStore::new());
        let barrier = Arc::new(Barrier::new(16));
        let now = Instant::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.check_and_record("contended", now, None)
                })
            })
            .collect();

        let fresh = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|fresh| *fresh)
            .count();

        assert_eq!(fresh, 1);
    }
}
