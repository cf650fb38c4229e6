//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the rate
//! limiting system:
//! - Rate definitions over a window hierarchy
//! - Per-user rate composition
//! - Fixed-window usage counters
//!
//! All types in this layer are pure and easily testable.

pub mod rate;
pub mod usage;
