//! Providers resolving the rate definition currently in force for a scope.
//!
//! A [`RateLimiter`](crate::application::limiter::RateLimiter) does not own
//! its thresholds; it asks a provider on every check so that dynamically
//! reconfigured or per-user-scaled definitions take effect without
//! rebuilding the limiter.

use crate::application::ports::{RateDefinitionSource, UserCountSource};
use crate::domain::rate::{PerUserRateDefinition, RateDefinition};
use std::fmt::Debug;
use std::sync::Arc;

/// Resolves the definition a limiter should enforce for a scope.
pub trait RateLimits: Send + Sync + Debug {
    /// The rate definition currently in force for `scope`.
    fn rate_limits(&self, scope: &str) -> RateDefinition;
}

/// A constant definition, independent of scope.
#[derive(Debug, Clone)]
pub struct FixedLimits {
    definition: RateDefinition,
}

impl FixedLimits {
    /// Create a provider that always yields `definition`.
    pub fn new(definition: RateDefinition) -> Self {
        Self { definition }
    }
}

impl RateLimits for FixedLimits {
    fn rate_limits(&self, _scope: &str) -> RateDefinition {
        self.definition
    }
}

/// A per-user composition scaled by the scope's active-user count.
#[derive(Debug, Clone)]
pub struct PerUserLimits {
    definition: PerUserRateDefinition,
    users: Arc<dyn UserCountSource>,
}

impl PerUserLimits {
    /// Create a provider scaling `definition` by counts from `users`.
    pub fn new(definition: PerUserRateDefinition, users: Arc<dyn UserCountSource>) -> Self {
        Self { definition, users }
    }
}

impl RateLimits for PerUserLimits {
    fn rate_limits(&self, scope: &str) -> RateDefinition {
        self.definition.rate_limits(self.users.n_users(scope))
    }
}

/// A named definition looked up dynamically, with a hard-coded fallback
/// used whenever the lookup yields nothing.
#[derive(Debug, Clone)]
pub struct DynamicLimits {
    key: String,
    source: Arc<dyn RateDefinitionSource>,
    fallback: RateDefinition,
}

impl DynamicLimits {
    /// Create a provider resolving `key` through `source`.
    pub fn new(
        key: impl Into<String>,
        source: Arc<dyn RateDefinitionSource>,
        fallback: RateDefinition,
    ) -> Self {
        Self {
            key: key.into(),
            source,
            fallback,
        }
    }

    /// The lookup key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl RateLimits for DynamicLimits {
    fn rate_limits(&self, _scope: &str) -> RateDefinition {
        self.source.definition(&self.key).unwrap_or(self.fallback)
    }
}
