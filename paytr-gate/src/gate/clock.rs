//! Time source for the duplicate tracker.
//!
//! The gate reads time through [`Clock`] so tests can move past the replay
//! window without sleeping.

use std::fmt::Debug;
use std::time::Instant;

/// Port for obtaining the current time.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Controllable clock for tests.
///
/// Clones share the same time value, so a clone handed to a [`Gate`] can be
/// advanced from the test body.
///
/// [`Gate`]: crate::gate::Gate
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: std::sync::Arc<std::sync::Mutex<Instant>>,
}

#[cfg(test)]
impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            current_time: std::sync::Arc::new(std::sync::Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: std::time::Duration) {
        let mut time = self.current_time.lock().expect("MockClock mutex poisoned");
        *time += duration;
    }
}

#[cfg(test)]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current_time.lock().expect("MockClock mutex poisoned")
    }
}
