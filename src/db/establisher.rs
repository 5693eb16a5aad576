//! Connection establishment with bounded retry.
//!
//! # Responsibilities
//! - Reject an empty DSN before any attempt
//! - Attempt to connect up to `retry.max_attempts` times with backoff
//! - Run at most one attempt sequence at a time; concurrent callers share it
//! - Surface exhaustion as a typed error instead of an empty handle
//!
//! The establisher owns the handle. A failed sequence leaves the cell empty,
//! so a later call starts a fresh sequence.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::{DatabaseConfig, PoolConfig};
use crate::db::pool::redact_dsn;
use crate::observability::metrics;
use crate::resilience::{retry_with_backoff, RetryExhausted};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("no database DSN configured (`aws.rds.local`)")]
    MissingDsn,

    #[error("database unreachable after {attempts} attempt(s): {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

/// Opens a pool against a DSN with the given limits applied.
#[async_trait]
pub trait Connect: Send + Sync {
    type Pool: Clone + Send + Sync + 'static;

    async fn connect(&self, dsn: &str, pool: &PoolConfig) -> Result<Self::Pool, sqlx::Error>;
}

pub struct ConnectionEstablisher<C: Connect> {
    connector: C,
    config: DatabaseConfig,
    handle: OnceCell<C::Pool>,
}

impl<C: Connect> ConnectionEstablisher<C> {
    pub fn new(connector: C, config: DatabaseConfig) -> Self {
        Self {
            connector,
            config,
            handle: OnceCell::new(),
        }
    }

    /// Return the pool, connecting first if no sequence has succeeded yet.
    pub async fn establish(&self) -> Result<C::Pool, DatabaseError> {
        let pool = self
            .handle
            .get_or_try_init(|| self.connect_with_retry())
            .await?;
        Ok(pool.clone())
    }

    /// The pool, if a sequence already succeeded.
    pub fn get(&self) -> Option<&C::Pool> {
        self.handle.get()
    }

    async fn connect_with_retry(&self) -> Result<C::Pool, DatabaseError> {
        if self.config.dsn.trim().is_empty() {
            return Err(DatabaseError::MissingDsn);
        }

        let target = redact_dsn(&self.config.dsn);
        tracing::info!(
            dsn = %target,
            max_attempts = self.config.retry.max_attempts,
            "Connecting to database"
        );

        let result = retry_with_backoff(&self.config.retry, "database connect", |attempt| {
            metrics::record_connect_attempt();
            tracing::debug!(attempt, "Opening database connection");
            self.connector.connect(&self.config.dsn, &self.config.pool)
        })
        .await;

        match result {
            Ok(pool) => {
                tracing::info!(
                    dsn = %target,
                    max_open = self.config.pool.max_open,
                    max_idle = self.config.pool.max_idle,
                    max_lifetime = ?self.config.pool.max_lifetime,
                    "Connected to database"
                );
                Ok(pool)
            }
            Err(RetryExhausted {
                attempts,
                last_error,
            }) => {
                metrics::record_connect_failure();
                Err(DatabaseError::Unreachable {
                    attempts,
                    source: last_error,
                })
            }
        }
    }
}
