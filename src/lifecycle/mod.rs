//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Database → Schema → AWS config → Clients → Handlers → Listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Close pool
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: database first, listener last
//! - Ordered shutdown: stop accept, drain, close
//! - Drain has a deadline: remaining connections are abandoned after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, bootstrap_with, prepare, Application, StartupError};
