//! Auth service library.
//!
//! Bootstraps the service: YAML configuration, a retried Postgres pool, AWS
//! clients and the HTTP shell serving the `UserRpcMethod` RPC.

pub mod cloud;
pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod repo;
pub mod resilience;
pub mod rpc;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{bootstrap, Application, Shutdown, StartupError};
