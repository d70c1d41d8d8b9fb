//! Monotonic time sources.
//!
//! Every animated drawable samples elapsed time from a [`Clock`] instead of
//! advancing state on a timer thread, so animations are deterministic: tests
//! drive a [`ManualClock`] while real hosts use the process [`UptimeClock`].

use std::cell::Cell;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// A monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now(&self) -> u64;
}

/// Shared handle to a clock.
pub type SharedClock = Arc<dyn Clock>;

/// Milliseconds since the process first asked for the time.
pub fn uptime_millis() -> u64 {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_millis() as u64
}

/// The process uptime clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct UptimeClock;

impl UptimeClock {
    /// A shared handle to the uptime clock.
    pub fn shared() -> SharedClock {
        Arc::new(UptimeClock)
    }
}

impl Clock for UptimeClock {
    fn now(&self) -> u64 {
        uptime_millis()
    }
}

/// A clock advanced explicitly, for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Creates a manual clock starting at `now` milliseconds.
    pub fn new(now: u64) -> Self {
        Self { now: Cell::new(now) }
    }

    /// A shared handle to a fresh manual clock.
    pub fn shared(now: u64) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(now))
    }

    /// Moves the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get() + millis);
    }

    /// Sets the absolute time.
    pub fn set(&self, millis: u64) {
        self.now.set(millis);
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
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);
        clock.advance(50);
        assert_eq!(clock.now(), 150);
        clock.set(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn test_uptime_is_monotonic() {
        let a = uptime_millis();
        let b = uptime_millis();
        assert!(b >= a);
    }
}
