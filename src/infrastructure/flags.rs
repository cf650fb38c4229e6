//! In-memory feature flag adapter.
//!
//! Production deployments typically back the
//! [`FeatureFlags`](crate::application::ports::FeatureFlags) port with a
//! shared flag service; this adapter covers single-process use and tests.

use crate::application::ports::FeatureFlags;
use dashmap::DashSet;

/// Flag set holding (flag, scope) pairs that are switched on.
#[derive(Debug, Default)]
pub struct StaticFlagSet {
    enabled: DashSet<(String, String)>,
}

impl StaticFlagSet {
    /// Create an empty flag set; every check returns false.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a flag for a scope.
    pub fn enable(&self, flag: impl Into<String>, scope: impl Into<String>) {
        self.enabled.insert((flag.into(), scope.into()));
    }

    /// Disable a flag for a scope.
    pub fn disable(&self, flag: &str, scope: &str) {
        self.enabled
            .remove(&(flag.to_string(), scope.to_string()));
    }
}

impl FeatureFlags for StaticFlagSet {
    fn enabled(&self, flag: &str, scope: &str) -> bool {
        self.enabled
            .contains(&(flag.to_string(), scope.to_string()))
    }
}
