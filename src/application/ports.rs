//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use crate::domain::rate::RateDefinition;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Port for obtaining current time and performing bounded sleeps.
///
/// Sleeping is part of the port so that blocking waits can be driven
/// deterministically by a mock clock in tests.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Port for concurrent key-value storage of usage state.
///
/// The backing store owns atomicity of each individual entry access.
/// No ordering is guaranteed between separate calls: a check in one call
/// and an increment in another are not atomic as a pair, so bursts of
/// concurrent callers can exceed a nominal threshold.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}

/// Port for emitting tagged counters and gauges to a metrics backend.
pub trait MetricsSink: Send + Sync + Debug {
    /// Increment a counter by `value`, tagged with `(key, value)` pairs.
    fn counter(&self, name: &str, value: u64, tags: &[(&str, &str)]);

    /// Set a gauge, tagged with `(key, value)` pairs.
    fn gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]);
}

/// Port for boolean feature gates keyed by flag name and scope.
///
/// Flag backends that namespace their keys fold the namespace into the
/// scope string; this crate only ever passes tenant identifiers.
pub trait FeatureFlags: Send + Sync + Debug {
    /// Whether the flag is enabled for the given scope.
    fn enabled(&self, flag: &str, scope: &str) -> bool;
}

/// Port for dynamic lookup of named rate definitions.
///
/// Returning `None` means the lookup had nothing for the key; callers
/// fall back to a hard-coded default definition.
pub trait RateDefinitionSource: Send + Sync + Debug {
    /// Look up the definition stored under `key`.
    fn definition(&self, key: &str) -> Option<RateDefinition>;
}

/// Port for the active-user count of a scope, used to scale per-user
/// rate definitions.
pub trait UserCountSource: Send + Sync + Debug {
    /// Number of users counted toward rate limiting for the scope.
    fn n_users(&self, scope: &str) -> u64;
}
