//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Startup call to an external dependency (database):
//!     → retries.rs (attempt, on failure sleep and try again)
//!     → backoff.rs (exponential delay with jitter)
//! ```
//!
//! # Design Decisions
//! - Retries are bounded; exhaustion is a typed error, never a silent default
//! - Jittered backoff prevents thundering herd on a recovering database

pub mod backoff;
pub mod retries;

pub use retries::{retry_with_backoff, RetryExhausted};
