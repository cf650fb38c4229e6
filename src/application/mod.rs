//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages runtime behavior:
//! - Rate limit providers (fixed, per-user, dynamic)
//! - Rate limiter (windowed usage tracking per scope)
//! - Submission policy (decision making with fail-open)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod limiter;
pub mod limits;
pub mod metrics;
pub mod policy;
pub mod ports;
