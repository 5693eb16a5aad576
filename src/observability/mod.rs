//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured JSON events to stdout + rotated file)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, file)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingError};
