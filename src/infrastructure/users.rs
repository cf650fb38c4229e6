//! In-memory active-user counts for per-user rate scaling.

use crate::application::ports::UserCountSource;
use dashmap::DashMap;

/// User counts per scope, settable at runtime.
///
/// Scopes without an entry count as zero users, which leaves a per-user
/// composition at its constant baseline.
#[derive(Debug, Default)]
pub struct StaticUserCounts {
    counts: DashMap<String, u64>,
}

impl StaticUserCounts {
    /// Create an empty count table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active-user count for a scope.
    pub fn set(&self, scope: impl Into<String>, n_users: u64) {
        self.counts.insert(scope.into(), n_users);
    }
}

impl UserCountSource for StaticUserCounts {
    fn n_users(&self, scope: &str) -> u64 {
        self.counts.get(scope).map(|n| *n).unwrap_or(0)
    }
}
