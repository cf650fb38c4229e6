//! Submission rate-limiting decisions.
//!
//! Orchestrates a global limiter and a per-tenant limiter into a single
//! decision per incoming submission. A submission is allowed if EITHER
//! limiter allows it; the asymmetric OR favors availability over strict
//! enforcement. When both limiters are saturated, a feature flag selects
//! between hard rejection and a dry-run mode that allows the submission
//! anyway while measuring how long enforcement would have delayed it.
//!
//! The entire decision fails open: a panic anywhere inside it is caught,
//! reported as an error metric, and converted into an allowed outcome.

use crate::application::limiter::{RateLimiter, UsageKey, GLOBAL_SCOPE};
use crate::application::metrics::PolicyMetrics;
use crate::application::ports::{Clock, FeatureFlags, MetricsSink, Storage};
use crate::domain::usage::ScopeUsage;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Flag gating hard enforcement per tenant.
pub const RATE_LIMIT_SUBMISSIONS_FLAG: &str = "rate_limit_submissions";

/// Counter emitted when a submission is rejected under enforcement.
pub const METRIC_RATE_LIMITED: &str = "submissions.rate_limited";
/// Counter emitted when a saturated submission goes through the dry run.
pub const METRIC_RATE_LIMITED_TEST: &str = "submissions.rate_limited.test";
/// Counter emitted when the decision path panics and fails open.
pub const METRIC_RATE_LIMITER_ERRORS: &str = "submissions.rate_limiter_errors";
/// Gauge of the global limiter's threshold per window.
pub const METRIC_GLOBAL_THRESHOLD: &str = "submissions.global_threshold";
/// Gauge of the global limiter's current usage per window.
pub const METRIC_GLOBAL_USAGE: &str = "submissions.global_usage";

/// Sentinel for "gauges never reported".
const NEVER_REPORTED: u64 = u64::MAX;

/// Duration buckets (seconds) for the dry-run wait tag.
const WAIT_BUCKETS: [u64; 5] = [1, 5, 10, 15, 20];

/// Outcome of one submission rate-limit decision.
///
/// The enforcement and dry-run rollout states are explicit variants so
/// each is independently observable and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// At least one limiter was under threshold; proceed normally.
    Allowed,
    /// Both limiters saturated and enforcement is on for the tenant.
    Rejected,
    /// Both limiters saturated but enforcement is off: the submission
    /// proceeds after a bounded wait simulating future enforcement.
    AllowedDryRun {
        /// Whether usage was granted before the wait timed out.
        acquired: bool,
        /// How long the simulated enforcement delayed the submission.
        waited: Duration,
    },
}

impl SubmissionOutcome {
    /// True unless the submission was rejected.
    pub fn is_allowed(&self) -> bool {
        !self.is_rejected()
    }

    /// True if the submission must be refused.
    pub fn is_rejected(&self) -> bool {
        matches!(self, SubmissionOutcome::Rejected)
    }
}

/// Tunables for the submission policy.
#[derive(Debug, Clone, Copy)]
pub struct PolicyConfig {
    /// Upper bound on the dry-run wait.
    pub dry_run_max_wait: Duration,
    /// Minimum spacing between global gauge reports.
    pub gauge_report_interval: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dry_run_max_wait: Duration::from_secs(15),
            gauge_report_interval: Duration::from_secs(60),
        }
    }
}

/// Decides, per submission, whether to allow, reject, or dry-run.
///
/// Owns both limiters and all collaborators explicitly; construct one per
/// process context instead of relying on global state.
pub struct SubmissionRatePolicy<S>
where
    S: Storage<UsageKey, ScopeUsage> + Clone,
{
    global: RateLimiter<S>,
    per_tenant: RateLimiter<S>,
    flags: Arc<dyn FeatureFlags>,
    sink: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
    metrics: PolicyMetrics,
    config: PolicyConfig,
    /// Nanoseconds since `epoch` of the last gauge report.
    last_gauge_report: AtomicU64,
    epoch: Instant,
}

impl<S> SubmissionRatePolicy<S>
where
    S: Storage<UsageKey, ScopeUsage> + Clone,
{
    /// Create a policy with default [`PolicyConfig`].
    ///
    /// # Arguments
    /// * `global` - Limiter tracking platform-wide usage (empty scope)
    /// * `per_tenant` - Limiter tracking usage per tenant
    /// * `flags` - Feature gate for hard enforcement
    /// * `sink` - Backend for tagged counters and gauges
    /// * `clock` - Time source shared with the limiters
    pub fn new(
        global: RateLimiter<S>,
        per_tenant: RateLimiter<S>,
        flags: Arc<dyn FeatureFlags>,
        sink: Arc<dyn MetricsSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let epoch = clock.now();
        Self {
            global,
            per_tenant,
            flags,
            sink,
            clock,
            metrics: PolicyMetrics::new(),
            config: PolicyConfig::default(),
            last_gauge_report: AtomicU64::new(NEVER_REPORTED),
            epoch,
        }
    }

    /// Replace the default configuration.
    pub fn with_config(mut self, config: PolicyConfig) -> Self {
        self.config = config;
        self
    }

    /// Decide whether a tenant's submission may proceed.
    ///
    /// A submission is allowed if either the global limiter or the
    /// tenant limiter is under threshold. Allowed submissions (including
    /// dry runs) are reported to both limiters.
    ///
    /// # Fail-Safe Behavior
    /// A panic anywhere inside the decision is caught and converted into
    /// [`SubmissionOutcome::Allowed`], with an error metric and log line.
    /// Availability is prioritized over strict enforcement.
    pub fn rate_limit_submission(&self, tenant: &str) -> SubmissionOutcome {
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| self.decide(tenant)));

        match result {
            Ok(outcome) => outcome,
            Err(_) => {
                self.metrics.record_error();
                self.sink
                    .counter(METRIC_RATE_LIMITER_ERRORS, 1, &[("tenant", tenant)]);
                tracing::error!(
                    tenant,
                    "submission rate limiter panicked; failing open and allowing the submission"
                );
                SubmissionOutcome::Allowed
            }
        }
    }

    /// Access the decision counters.
    pub fn metrics(&self) -> &PolicyMetrics {
        &self.metrics
    }

    fn decide(&self, tenant: &str) -> SubmissionOutcome {
        // OR, not AND: a saturated tenant still gets through while the
        // platform as a whole has headroom, and vice versa.
        let should_allow =
            self.global.allow_usage(GLOBAL_SCOPE) || self.per_tenant.allow_usage(tenant);

        let outcome = if should_allow {
            self.metrics.record_allowed();
            SubmissionOutcome::Allowed
        } else if self.flags.enabled(RATE_LIMIT_SUBMISSIONS_FLAG, tenant) {
            self.metrics.record_rejected();
            self.sink
                .counter(METRIC_RATE_LIMITED, 1, &[("tenant", tenant)]);
            SubmissionOutcome::Rejected
        } else {
            self.dry_run(tenant)
        };

        if outcome.is_allowed() {
            self.per_tenant.report_usage(tenant);
            self.global.report_usage(GLOBAL_SCOPE);
            self.maybe_report_global_rates();
        }

        outcome
    }

    /// Enforcement rehearsal: wait as a future hard limit would, then
    /// allow regardless and record how long the wait took.
    fn dry_run(&self, tenant: &str) -> SubmissionOutcome {
        let started = self.clock.now();
        let acquired = self.per_tenant.wait(tenant, self.config.dry_run_max_wait);
        let waited = self.clock.now().saturating_duration_since(started);

        let duration_tag = if acquired {
            duration_bucket(waited, &WAIT_BUCKETS)
        } else {
            "timeout".to_string()
        };
        self.sink.counter(
            METRIC_RATE_LIMITED_TEST,
            1,
            &[("tenant", tenant), ("duration", &duration_tag)],
        );
        self.metrics.record_dry_run();

        SubmissionOutcome::AllowedDryRun { acquired, waited }
    }

    /// Export the global limiter's thresholds and usage as gauges, at
    /// most once per configured interval.
    fn maybe_report_global_rates(&self) {
        let now_nanos = self
            .clock
            .now()
            .saturating_duration_since(self.epoch)
            .as_nanos()
            .try_into()
            .unwrap_or(u64::MAX - 1);
        let interval_nanos = self.config.gauge_report_interval.as_nanos() as u64;

        let last = self.last_gauge_report.load(Ordering::Acquire);
        let due = last == NEVER_REPORTED || now_nanos.saturating_sub(last) >= interval_nanos;
        if !due {
            return;
        }
        // One reporter per interval even under concurrent submissions.
        if self
            .last_gauge_report
            .compare_exchange(last, now_nanos, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        for rate in self.global.iter_rates(GLOBAL_SCOPE) {
            let tags = [("window", rate.window.as_str())];
            self.sink.gauge(METRIC_GLOBAL_THRESHOLD, rate.threshold, &tags);
            self.sink.gauge(METRIC_GLOBAL_USAGE, rate.current, &tags);
        }
    }
}

/// Bucket an elapsed duration into a low-cardinality metric tag.
///
/// Produces `lt_001s`-style tags for the first bucket whose bound exceeds
/// the duration, or `over_020s` past the last bound.
fn duration_bucket(elapsed: Duration, bounds_secs: &[u64]) -> String {
    for &bound in bounds_secs {
        if elapsed.as_secs_f64() < bound as f64 {
            return format!("lt_{:03}s", bound);
        }
    }
    format!("over_{:03}s", bounds_secs.last().copied().unwrap_or(0))
}
