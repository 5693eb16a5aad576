//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection (net::listener)
//!     → server.rs (hyper auto HTTP/1.1 + HTTP/2, idle and read limits)
//!     → request.rs (path normalization, request ID header)
//!     → Axum router + middleware (timeouts, server header, tracing)
//!     → handlers.rs (health, UserExistenceCall)
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use handlers::{register, AppState};
pub use request::X_REQUEST_ID;
pub use server::{HttpServer, RouterService};
