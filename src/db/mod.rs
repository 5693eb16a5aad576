//! Database subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig (dsn, pool limits, retry policy)
//!     → establisher.rs (once-guarded, retry with backoff)
//!     → pool.rs (sqlx PgPool with limits applied)
//!     → PgPool cloned into the repository and health checks
//! ```

pub mod establisher;
pub mod pool;

pub use establisher::{Connect, ConnectionEstablisher, DatabaseError};
pub use pool::{pool_limits, pool_options, redact_dsn, PgConnector};
