//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, idle timeout)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionActivity, ConnectionTracker, IdleTimeout};
pub use listener::{Listener, ListenerError};
