//! Pluggable wall-clock.
//!
//! The dispatcher's only external effect on the hot path is reading "now".
//! Production code reads the real system clock; tests need to jump time
//! forward by hundreds of seconds without actually sleeping (aging-cycle
//! scenarios), so `now` is read through a trait rather than calling
//! `SystemTime::now()` directly the way `sase_common::Timestamp` does.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current wall-clock time, in whole seconds.
///
/// Second resolution matches the source algorithm's use of `time(NULL)`:
/// every idle/aging threshold in the dispatcher is specified in seconds.
pub trait Clock {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// Real wall-clock, backed by `SystemTime::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs()
    }
}

/// Manually-advanced clock for deterministic tests.
///
/// Starts at an arbitrary fixed epoch (not "real now", so tests never
/// depend on wall-clock time) and only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Create a manual clock starting at the given time.
    pub fn new(start: u64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Advance the clock by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get() + secs);
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, at: u64) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        clock.advance(1_000);
        assert_eq!(clock.now(), 2_000);
        clock.set(50);
        assert_eq!(clock.now(), 50);
    }

    #[test]
    fn system_clock_is_recent() {
        let clock = SystemClock;
        // Any time after this crate's existence is a sane sanity bound.
        assert!(clock.now() > 1_600_000_000);
    }
}
