//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect to the database (once, with retry)
//! - Prepare the schema and build the repository and RPC service
//! - Load shared AWS configuration and build the service clients
//! - Register handlers and bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last, so traffic only arrives once everything is ready

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::BuildError;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::cloud::{load_cloud_config, CloudClients, CloudError};
use crate::config::{load_config, AppConfig, ConfigError};
use crate::db::{redact_dsn, Connect, ConnectionEstablisher, DatabaseError, PgConnector};
use crate::http::{handlers, AppState, HttpServer};
use crate::net::{Listener, ListenerError};
use crate::observability::{init_logging, metrics, LoggingError};
use crate::repo::{PgAuthRepository, RepoError};
use crate::rpc::UserExistenceService;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("schema setup failed: {0}")]
    Schema(#[from] RepoError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("metrics exporter failed to start: {0}")]
    Metrics(#[from] BuildError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// A fully initialized service, ready to serve.
pub struct Application {
    config: AppConfig,
    pool: PgPool,
    cloud: CloudClients,
    server: HttpServer,
    listener: Listener,
}

impl Application {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn cloud(&self) -> &CloudClients {
        &self.cloud
    }

    pub fn server(&self) -> &HttpServer {
        &self.server
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` fires, then drain connections and close the
    /// pool.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        let drain_timeout = self.config.listener.shutdown_timeout;
        self.server.run(self.listener, shutdown, drain_timeout).await?;

        self.pool.close().await;
        tracing::info!("Database pool closed");
        Ok(())
    }
}

/// Load configuration from `config_dir` and install logging from it.
///
/// Nothing can be logged before this succeeds.
pub fn prepare(config_dir: &Path) -> Result<AppConfig, StartupError> {
    let config = load_config(config_dir)?;
    init_logging(&config.log)?;
    Ok(config)
}

/// Initialize every subsystem in dependency order.
pub async fn bootstrap(config: AppConfig) -> Result<Application, StartupError> {
    bootstrap_with(config, PgConnector).await
}

/// [`bootstrap`] with the database connection step supplied by the caller.
pub async fn bootstrap_with<C>(config: AppConfig, connector: C) -> Result<Application, StartupError>
where
    C: Connect<Pool = PgPool>,
{
    let started = Instant::now();

    tracing::info!(
        dsn = %redact_dsn(&config.database.dsn),
        max_open = config.database.pool.max_open,
        bind_address = %config.listener.bind_address,
        region = %config.cloud.region,
        "Configuration loaded"
    );

    let establisher = ConnectionEstablisher::new(connector, config.database.clone());
    let pool = establisher.establish().await?;

    let repo = Arc::new(PgAuthRepository::new(pool.clone()));
    repo.ensure_schema().await?;

    let sdk_config = load_cloud_config(&config.cloud).await?;
    let cloud = CloudClients::from_config(&sdk_config);

    let rpc = Arc::new(UserExistenceService::new(repo.clone()));
    let state = AppState {
        app_name: Arc::from(config.server.app_name.as_str()),
        repo,
        rpc,
    };
    let server = handlers::register(HttpServer::new(config.server.clone()), state);

    let listener = Listener::bind(&config.listener).await?;

    let elapsed = started.elapsed();
    metrics::record_startup(elapsed);
    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "Startup complete");

    Ok(Application {
        config,
        pool,
        cloud,
        server,
        listener,
    })
}
