//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly. Sleeps advance the
/// mock time instead of blocking, so polling waits run instantly and
/// deterministically.
///
/// # Thread Safety
///
/// `MockClock` is thread-safe and can be cloned to share across threads.
/// All clones share the same underlying time value.
#[derive(Debug, Clone)]
pub struct MockClock {
    inner: Arc<Mutex<MockClockState>>,
}

#[derive(Debug)]
struct MockClockState {
    current_time: Instant,
    total_slept: Duration,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockClockState {
                current_time: start,
                total_slept: Duration::ZERO,
            })),
        }
    }

    /// Advance the clock by a duration without counting it as sleep.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.current_time += duration;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        let mut state = self.lock();
        state.current_time = instant;
    }

    /// Total duration spent in `sleep` calls.
    pub fn slept(&self) -> Duration {
        self.lock().total_slept
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockClockState> {
        self.inner
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.lock().current_time
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.current_time += duration;
        state.total_slept += duration;
    }
}
