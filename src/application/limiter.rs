//! Windowed usage tracking against a configured rate definition.
//!
//! A [`RateLimiter`] is keyed by a feature and tracks usage per scope
//! (typically a tenant identifier). It resolves its thresholds through a
//! [`RateLimits`] provider on every check, so dynamic definitions take
//! effect immediately.

use crate::application::limits::RateLimits;
use crate::application::ports::{Clock, Storage};
use crate::domain::rate::RateWindow;
use crate::domain::usage::ScopeUsage;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Scope under which global (scope-less) usage is tracked.
pub const GLOBAL_SCOPE: &str = "";

/// Storage key for one (feature, scope) usage record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsageKey {
    /// The feature this usage belongs to (e.g. `"submissions"`).
    pub feature: String,
    /// The scope tracked independently, empty for global usage.
    pub scope: String,
}

/// One window's usage against its threshold, as reported by
/// [`RateLimiter::iter_rates`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateUsage {
    /// The window granularity.
    pub window: RateWindow,
    /// Events counted in the current window.
    pub current: f64,
    /// The configured threshold for this window.
    pub threshold: f64,
}

/// Tracks usage per scope and answers whether more is allowed.
///
/// The check/report pair is deliberately not atomic: concurrent callers
/// sharing a scope can each pass `allow_usage` before any of them reports,
/// so bursts can exceed the nominal threshold. The backing storage only
/// guarantees atomicity of each individual call.
#[derive(Clone)]
pub struct RateLimiter<S>
where
    S: Storage<UsageKey, ScopeUsage> + Clone,
{
    feature_key: String,
    limits: Arc<dyn RateLimits>,
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S> RateLimiter<S>
where
    S: Storage<UsageKey, ScopeUsage> + Clone,
{
    /// Minimum delay between polls in [`RateLimiter::wait`].
    const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
    /// Maximum delay between polls in [`RateLimiter::wait`].
    const MAX_POLL_INTERVAL: Duration = Duration::from_millis(500);

    /// Create a limiter for a feature.
    ///
    /// # Arguments
    /// * `feature_key` - Namespace for usage keys, shared by all scopes
    /// * `limits` - Provider of the definition currently in force
    /// * `storage` - Backing store for usage counters
    /// * `clock` - Time source, also used for the polling wait
    pub fn new(
        feature_key: impl Into<String>,
        limits: Arc<dyn RateLimits>,
        storage: S,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            feature_key: feature_key.into(),
            limits,
            storage,
            clock,
        }
    }

    /// The feature key this limiter tracks usage under.
    pub fn feature_key(&self) -> &str {
        &self.feature_key
    }

    /// Non-blocking check against all configured windows.
    ///
    /// Returns false if any window's counter has reached its threshold.
    /// Does not mutate usage; callers that proceed must follow up with
    /// [`RateLimiter::report_usage`].
    pub fn allow_usage(&self, scope: &str) -> bool {
        let limits = self.limits.rate_limits(scope);
        if limits.is_empty() {
            return true;
        }
        self.with_usage(scope, |usage, now| {
            limits
                .limited_windows()
                .all(|(window, threshold)| (usage.current(window, now) as f64) < threshold)
        })
    }

    /// Record one event against every window counter.
    pub fn report_usage(&self, scope: &str) {
        self.report_usage_by(scope, 1);
    }

    /// Record `delta` events against every window counter.
    ///
    /// Always increments; there is no idempotence or deduplication.
    pub fn report_usage_by(&self, scope: &str, delta: u64) {
        self.with_usage(scope, |usage, now| usage.record(now, delta));
    }

    /// Block until usage is allowed or `timeout` elapses.
    ///
    /// Polls [`RateLimiter::allow_usage`] with a bounded sleep between
    /// attempts. Returns within `timeout` plus at most one poll interval
    /// of scheduling jitter. The only cancellation is the timeout itself.
    pub fn wait(&self, scope: &str, timeout: Duration) -> bool {
        let deadline = self.clock.now() + timeout;
        let interval = (timeout / 16).clamp(Self::MIN_POLL_INTERVAL, Self::MAX_POLL_INTERVAL);

        loop {
            if self.allow_usage(scope) {
                return true;
            }
            if self.clock.now() + interval > deadline {
                return false;
            }
            self.clock.sleep(interval);
        }
    }

    /// Snapshot of (window, current, threshold) for every limited window.
    ///
    /// Finite and recomputed on each call; suitable for gauge export.
    pub fn iter_rates(&self, scope: &str) -> Vec<RateUsage> {
        let limits = self.limits.rate_limits(scope);
        self.with_usage(scope, |usage, now| {
            limits
                .limited_windows()
                .map(|(window, threshold)| RateUsage {
                    window,
                    current: usage.current(window, now) as f64,
                    threshold,
                })
                .collect()
        })
    }

    /// Number of scopes with tracked usage in the backing storage.
    pub fn tracked_scopes(&self) -> usize {
        self.storage.len()
    }

    /// Access or create usage state for a scope with a callback.
    fn with_usage<F, R>(&self, scope: &str, f: F) -> R
    where
        F: FnOnce(&mut ScopeUsage, Instant) -> R,
    {
        let now = self.clock.now();
        let key = UsageKey {
            feature: self.feature_key.clone(),
            scope: scope.to_string(),
        };
        self.storage
            .with_entry_mut(key, || ScopeUsage::new(now), |usage| f(usage, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::limits::FixedLimits;
    use crate::domain::rate::RateDefinition;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;

    fn limiter_with(
        definition: RateDefinition,
        clock: Arc<MockClock>,
    ) -> RateLimiter<Arc<ShardedStorage<UsageKey, ScopeUsage>>> {
        RateLimiter::new(
            "submissions",
            Arc::new(FixedLimits::new(definition)),
            Arc::new(ShardedStorage::new()),
            clock,
        )
    }

    #[test]
    fn test_allow_until_threshold_reached() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_minute: Some(3.0),
                ..Default::default()
            },
            clock,
        );

        for _ in 0..3 {
            assert!(limiter.allow_usage("tenant-a"));
            limiter.report_usage("tenant-a");
        }
        assert!(!limiter.allow_usage("tenant-a"));
    }

    #[test]
    fn test_allow_again_after_window_rolls_over() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_second: Some(1.0),
                ..Default::default()
            },
            clock.clone(),
        );

        limiter.report_usage("tenant-a");
        assert!(!limiter.allow_usage("tenant-a"));

        clock.advance(Duration::from_secs(1));
        assert!(limiter.allow_usage("tenant-a"));
    }

    #[test]
    fn test_scopes_are_independent() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_day: Some(1.0),
                ..Default::default()
            },
            clock,
        );

        limiter.report_usage("tenant-a");
        assert!(!limiter.allow_usage("tenant-a"));
        assert!(limiter.allow_usage("tenant-b"));
    }

    #[test]
    fn test_fifty_per_day_saturates_on_fifty_first() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_day: Some(50.0),
                ..Default::default()
            },
            clock,
        );

        for _ in 0..50 {
            assert!(limiter.allow_usage("tenant-a"));
            limiter.report_usage("tenant-a");
        }
        assert!(!limiter.allow_usage("tenant-a"));
    }

    #[test]
    fn test_fractional_threshold_blocks_after_first_event() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_second: Some(0.5),
                ..Default::default()
            },
            clock,
        );

        // Zero counted events sit below the fractional threshold.
        assert!(limiter.allow_usage("tenant-a"));
        limiter.report_usage("tenant-a");
        assert!(!limiter.allow_usage("tenant-a"));
    }

    #[test]
    fn test_unlimited_definition_always_allows() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(RateDefinition::default(), clock);

        for _ in 0..1000 {
            limiter.report_usage("tenant-a");
        }
        assert!(limiter.allow_usage("tenant-a"));
    }

    #[test]
    fn test_wait_returns_immediately_when_allowed() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_minute: Some(10.0),
                ..Default::default()
            },
            clock.clone(),
        );

        assert!(limiter.wait("tenant-a", Duration::from_secs(15)));
        // No sleeping happened.
        assert_eq!(clock.slept(), Duration::ZERO);
    }

    #[test]
    fn test_wait_acquires_after_rollover() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_second: Some(1.0),
                ..Default::default()
            },
            clock.clone(),
        );

        limiter.report_usage("tenant-a");
        // Mock sleeps advance the clock, so the one-second window rolls
        // over well inside the timeout.
        assert!(limiter.wait("tenant-a", Duration::from_secs(15)));
    }

    #[test]
    fn test_wait_times_out_within_bound() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_day: Some(1.0),
                ..Default::default()
            },
            clock.clone(),
        );

        limiter.report_usage("tenant-a");
        let timeout = Duration::from_secs(15);
        assert!(!limiter.wait("tenant-a", timeout));

        // Total simulated sleep stays within the timeout bound.
        assert!(clock.slept() <= timeout);
    }

    #[test]
    fn test_iter_rates_reports_usage_and_thresholds() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_minute: Some(400.0),
                per_second: Some(30.0),
                ..Default::default()
            },
            clock,
        );

        limiter.report_usage_by(GLOBAL_SCOPE, 5);

        let rates = limiter.iter_rates(GLOBAL_SCOPE);
        assert_eq!(rates.len(), 2);
        assert_eq!(
            rates[0],
            RateUsage {
                window: RateWindow::Second,
                current: 5.0,
                threshold: 30.0
            }
        );
        assert_eq!(rates[1].window, RateWindow::Minute);
        assert_eq!(rates[1].current, 5.0);
    }

    #[test]
    fn test_iter_rates_restartable() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter_with(
            RateDefinition {
                per_hour: Some(100.0),
                ..Default::default()
            },
            clock,
        );

        limiter.report_usage("t");
        assert_eq!(limiter.iter_rates("t"), limiter.iter_rates("t"));
    }

    #[test]
    fn test_concurrent_reports_count_every_event() {
        use std::thread;

        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = Arc::new(limiter_with(
            RateDefinition {
                per_week: Some(10_000.0),
                ..Default::default()
            },
            clock,
        ));

        let mut handles = vec![];
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    limiter.report_usage("tenant-a");
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let rates = limiter.iter_rates("tenant-a");
        assert_eq!(rates[0].current, 800.0);
    }
}
