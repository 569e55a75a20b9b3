//! Clock abstraction for health timestamps and latency measurement.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// Source of monotonic and wall-clock time.
///
/// Production code uses `RealClock`; tests inject `TestClock` to get
/// deterministic timestamps and response times.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Monotonic instant, used for probe latency.
    fn now(&self) -> Instant;

    /// Wall-clock time, used for response timestamps.
    fn now_system(&self) -> SystemTime;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates the system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock for tests.
///
/// Clones share the same underlying time, so a handle kept by the test can
/// move the clock seen by the code under test.
#[derive(Debug, Clone)]
pub struct TestClock {
    elapsed_ns: Arc<AtomicU64>,
    start_ns: u64,
    base_instant: Instant,
}

impl TestClock {
    /// Creates a test clock starting at the current wall-clock time.
    pub fn new() -> Self {
        Self::with_start_time(SystemTime::now())
    }

    /// Creates a test clock starting at `start`.
    pub fn with_start_time(start: SystemTime) -> Self {
        Self {
            elapsed_ns: Arc::new(AtomicU64::new(0)),
            start_ns: duration_to_ns(start.duration_since(UNIX_EPOCH).unwrap_or_default()),
            base_instant: Instant::now(),
        }
    }

    /// Advances both monotonic and system time.
    pub fn advance(&self, duration: Duration) {
        self.elapsed_ns.fetch_add(duration_to_ns(duration), Ordering::AcqRel);
    }

    /// Returns the total time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::Acquire))
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.base_instant + self.elapsed()
    }

    fn now_system(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(self.start_ns.saturating_add(duration_to_ns(self.elapsed())))
    }
}

fn duration_to_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let clock = TestClock::new();
        let start = clock.now();

        clock.advance(Duration::from_millis(250));

        assert_eq!(clock.now().duration_since(start), Duration::from_millis(250));
    }

    #[test]
    fn test_clock_system_time_follows_advance() {
        let start = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let clock = TestClock::with_start_time(start);
        assert_eq!(clock.now_system(), start);

        clock.advance(Duration::from_secs(30));
        assert_eq!(clock.now_system(), start + Duration::from_secs(30));
    }

    #[test]
    fn clones_share_time() {
        let clock = TestClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_secs(1));

        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }
}
