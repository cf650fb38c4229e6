//! # submission-throttle
//!
//! Multi-window rate limiting for form submissions in a multi-tenant
//! platform, with a dry-run rollout mode and fail-open semantics.
//!
//! This crate provides the policy layer that decides, per incoming
//! submission, whether the sender has exceeded its rate limits. Two
//! limiters cooperate:
//!
//! - a **global limiter** protecting the platform as a whole, and
//! - a **per-tenant limiter** whose thresholds scale with each tenant's
//!   active-user count.
//!
//! A submission is allowed if EITHER limiter is under threshold. The OR is
//! deliberate: a single noisy tenant is not throttled while the platform
//! has headroom, and platform pressure alone does not single out tenants
//! that are within their own budget.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use submission_throttle::{
//!     standard_ratio_rate_definition, DynamicLimits, LimitsConfig, PerUserLimits,
//!     PerUserRateDefinition, RateDefinition, RateLimiter, ShardedStorage, StaticFlagSet,
//!     StaticUserCounts, SubmissionRatePolicy, SystemClock, TracingMetricsSink,
//! };
//!
//! let storage = Arc::new(ShardedStorage::new());
//! let clock = Arc::new(SystemClock::new());
//!
//! // Global thresholds come from configuration, with a hard-coded
//! // fallback if the named definition is missing.
//! let config = LimitsConfig::from_toml_str(
//!     r#"
//!     [definitions.global_submissions]
//!     per_hour = 17000.0
//!     per_minute = 400.0
//!     per_second = 30.0
//!     "#,
//! )
//! .unwrap();
//! let fallback = RateDefinition {
//!     per_hour: Some(17000.0),
//!     per_minute: Some(400.0),
//!     per_second: Some(30.0),
//!     ..Default::default()
//! };
//! let global = RateLimiter::new(
//!     "global_submissions",
//!     Arc::new(DynamicLimits::new("global_submissions", Arc::new(config), fallback)),
//!     storage.clone(),
//!     clock.clone(),
//! );
//!
//! // Per-tenant thresholds: a constant baseline plus a per-user share.
//! let per_tenant = RateLimiter::new(
//!     "submissions",
//!     Arc::new(PerUserLimits::new(
//!         PerUserRateDefinition::new(
//!             standard_ratio_rate_definition(46.0),
//!             RateDefinition {
//!                 per_week: Some(100.0),
//!                 per_day: Some(50.0),
//!                 per_hour: Some(30.0),
//!                 per_minute: Some(10.0),
//!                 per_second: Some(1.0),
//!             },
//!         ),
//!         Arc::new(StaticUserCounts::new()),
//!     )),
//!     storage,
//!     clock.clone(),
//! );
//!
//! let policy = SubmissionRatePolicy::new(
//!     global,
//!     per_tenant,
//!     Arc::new(StaticFlagSet::new()),
//!     Arc::new(TracingMetricsSink::new()),
//!     clock,
//! );
//!
//! let outcome = policy.rate_limit_submission("tenant-a");
//! assert!(outcome.is_allowed());
//! ```
//!
//! ## Decision Modes
//!
//! When both limiters are saturated, a per-tenant feature flag
//! (`rate_limit_submissions`) selects the rollout state:
//!
//! - **Enforced**: the submission is rejected and the
//!   `submissions.rate_limited` counter is emitted.
//! - **Dry run** (flag off): the submission is allowed anyway, after a
//!   bounded wait simulating what enforcement would have cost; the
//!   outcome is emitted as `submissions.rate_limited.test`, tagged with a
//!   bucketed wait duration. This measures the impact of a future hard
//!   rollout before turning it on.
//!
//! The outcome is an explicit [`SubmissionOutcome`] variant per mode, so
//! both rollout states are independently observable and testable.
//!
//! ## Fail-Open Operation
//!
//! Rate limiting must never take the write path down. The whole decision
//! runs under panic protection: any panic is caught, reported via the
//! `submissions.rate_limiter_errors` counter and a `tracing::error!`,
//! and turned into an allowed outcome.
//!
//! ## Concurrency
//!
//! Usage counters live in sharded concurrent storage; every individual
//! access is atomic, but the check in `allow_usage` and the increment in
//! `report_usage` are separate accesses. Concurrent submissions for the
//! same scope can therefore each pass the check before any increment
//! lands, so bursts can exceed a nominal threshold by the number of
//! in-flight callers. Thresholds here are operational budgets, not hard
//! security bounds.
//!
//! ## Observability
//!
//! Tagged counters and gauges go through the [`MetricsSink`] port; the
//! built-in [`TracingMetricsSink`] emits them as structured `tracing`
//! events. The global limiter's thresholds and usage are exported as
//! `submissions.global_threshold` / `submissions.global_usage` gauges per
//! window, at most once a minute. Process-local decision counts are
//! available via [`SubmissionRatePolicy::metrics`].
//!
//! ## Testing
//!
//! Enable the `test-helpers` feature to get a [`MockClock`] whose sleeps
//! advance simulated time (making the polling `wait` instantaneous and
//! deterministic) and a [`RecordingMetricsSink`] for asserting on emitted
//! metrics.
//!
//! [`MockClock`]: infrastructure::mocks::MockClock
//! [`RecordingMetricsSink`]: infrastructure::mocks::RecordingMetricsSink

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    rate::{
        standard_ratio_rate_definition, PerUserRateDefinition, RateDefinition,
        RateDefinitionError, RateWindow,
    },
    usage::{ScopeUsage, WindowCounter},
};

pub use application::{
    limiter::{RateLimiter, RateUsage, UsageKey, GLOBAL_SCOPE},
    limits::{DynamicLimits, FixedLimits, PerUserLimits, RateLimits},
    metrics::{PolicyMetrics, PolicyMetricsSnapshot},
    policy::{
        PolicyConfig, SubmissionOutcome, SubmissionRatePolicy, METRIC_GLOBAL_THRESHOLD,
        METRIC_GLOBAL_USAGE, METRIC_RATE_LIMITED, METRIC_RATE_LIMITED_TEST,
        METRIC_RATE_LIMITER_ERRORS, RATE_LIMIT_SUBMISSIONS_FLAG,
    },
    ports::{Clock, FeatureFlags, MetricsSink, RateDefinitionSource, Storage, UserCountSource},
};

pub use infrastructure::{
    clock::SystemClock,
    config::{proportionality_warnings, ConfigError, LimitsConfig},
    flags::StaticFlagSet,
    metrics::{TracingMetricsSink, METRICS_TARGET},
    storage::ShardedStorage,
    users::StaticUserCounts,
};

#[cfg(any(test, feature = "test-helpers"))]
pub use infrastructure::mocks::{MockClock, RecordedMetric, RecordingMetricsSink};
