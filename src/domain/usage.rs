//! Per-scope usage counters over fixed time windows.
//!
//! Each scope tracks one counter per window granularity. Counters use
//! fixed-window semantics: when enough time has passed, the window start
//! advances by whole window lengths and the count resets, so usage expires
//! naturally as its window closes.

use crate::domain::rate::RateWindow;
use std::time::Instant;

/// Rolling event count within one fixed window.
#[derive(Debug, Clone, Copy)]
pub struct WindowCounter {
    window: RateWindow,
    window_start: Instant,
    count: u64,
}

impl WindowCounter {
    /// Create a counter whose first window opens at `now`.
    pub fn new(window: RateWindow, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            count: 0,
        }
    }

    /// The window granularity this counter tracks.
    pub fn window(&self) -> RateWindow {
        self.window
    }

    /// Current count, rolling the window forward first if it has closed.
    pub fn current(&mut self, now: Instant) -> u64 {
        self.roll(now);
        self.count
    }

    /// Add events to the current window.
    pub fn record(&mut self, now: Instant, delta: u64) {
        self.roll(now);
        self.count = self.count.saturating_add(delta);
    }

    /// Advance the window start by whole window lengths until `now` falls
    /// inside the current window. A multi-window gap skips straight to the
    /// window containing `now`.
    fn roll(&mut self, now: Instant) {
        let len = self.window.duration();
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= len {
            let windows_passed = (elapsed.as_nanos() / len.as_nanos()).min(u32::MAX as u128);
            let advance = len.saturating_mul(windows_passed as u32);
            self.window_start += advance;
            self.count = 0;
        }
    }
}

/// Usage state for one (feature, scope) pair: a counter per window.
#[derive(Debug, Clone)]
pub struct ScopeUsage {
    counters: [WindowCounter; 5],
}

impl ScopeUsage {
    /// Create usage state with all five windows opening at `now`.
    ///
    /// All windows are always tracked, not just the currently limited
    /// ones, so a dynamically changed definition sees correct history.
    pub fn new(now: Instant) -> Self {
        Self {
            counters: RateWindow::ALL.map(|w| WindowCounter::new(w, now)),
        }
    }

    /// Current count for one window.
    pub fn current(&mut self, window: RateWindow, now: Instant) -> u64 {
        self.counters[window.index()].current(now)
    }

    /// Record events against every window.
    pub fn record(&mut self, now: Instant, delta: u64) {
        for counter in &mut self.counters {
            counter.record(now, delta);
        }
    }
}
