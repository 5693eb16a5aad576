//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config.yaml in the config directory
//!     → loader.rs (locate & parse)
//!     → store.rs (dotted, case-insensitive key access)
//!     → schema.rs (typed sections with defaults)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed by value to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Missing keys read as zero values; only hard-coded service defaults are
//!   filled in by the schema
//! - Validation separates casting (store) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, CloudConfig, DatabaseConfig, ListenerConfig, LogConfig, MetricsConfig, PoolConfig,
    RetryConfig, ServerConfig,
};
pub use store::ConfigStore;
pub use validation::ValidationError;
