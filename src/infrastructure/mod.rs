//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - Configuration loading (TOML rate definitions)
//! - Metrics emission (tracing-backed sink)
//! - Feature flags and user counts (in-memory tables)

pub mod clock;
pub mod config;
pub mod flags;
pub mod metrics;
pub mod storage;
pub mod users;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is
/// enabled, or during test builds. It provides controllable test doubles
/// for testing rate limiting behavior.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// submission-throttle = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
