//! Observability counters for submission rate limiting decisions.
//!
//! These are cheap process-local counters; tagged metric emission toward a
//! metrics backend goes through the
//! [`MetricsSink`](crate::application::ports::MetricsSink) port instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters tracking policy decisions.
///
/// All counters use atomic operations for thread-safe updates and reads.
/// Clones share the same underlying counters.
#[derive(Debug, Clone)]
pub struct PolicyMetrics {
    inner: Arc<PolicyMetricsInner>,
}

#[derive(Debug)]
struct PolicyMetricsInner {
    /// Submissions allowed with no limiter saturated
    allowed: AtomicU64,
    /// Submissions rejected under enforcement
    rejected: AtomicU64,
    /// Submissions allowed through the dry-run path
    dry_runs: AtomicU64,
    /// Decisions that failed open after an internal panic
    errors: AtomicU64,
}

impl PolicyMetrics {
    /// Create a new counter set.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PolicyMetricsInner {
                allowed: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                dry_runs: AtomicU64::new(0),
                errors: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dry_run(&self) {
        self.inner.dry_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Submissions allowed with no limiter saturated.
    pub fn allowed(&self) -> u64 {
        self.inner.allowed.load(Ordering::Relaxed)
    }

    /// Submissions rejected under enforcement.
    pub fn rejected(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }

    /// Submissions allowed through the dry-run path.
    pub fn dry_runs(&self) -> u64 {
        self.inner.dry_runs.load(Ordering::Relaxed)
    }

    /// Decisions that failed open after an internal panic.
    pub fn errors(&self) -> u64 {
        self.inner.errors.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> PolicyMetricsSnapshot {
        PolicyMetricsSnapshot {
            allowed: self.allowed(),
            rejected: self.rejected(),
            dry_runs: self.dry_runs(),
            errors: self.errors(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.allowed.store(0, Ordering::Relaxed);
        self.inner.rejected.store(0, Ordering::Relaxed);
        self.inner.dry_runs.store(0, Ordering::Relaxed);
        self.inner.errors.store(0, Ordering::Relaxed);
    }
}

impl Default for PolicyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of [`PolicyMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyMetricsSnapshot {
    /// Submissions allowed with no limiter saturated
    pub allowed: u64,
    /// Submissions rejected under enforcement
    pub rejected: u64,
    /// Submissions allowed through the dry-run path
    pub dry_runs: u64,
    /// Decisions that failed open after an internal panic
    pub errors: u64,
}

impl PolicyMetricsSnapshot {
    /// Total decisions made (every variant, including fail-open).
    pub fn total_decisions(&self) -> u64 {
        self.allowed
            .saturating_add(self.rejected)
            .saturating_add(self.dry_runs)
            .saturating_add(self.errors)
    }
}
