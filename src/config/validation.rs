//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (the store only casts values)
//! - Validate value ranges (attempts > 0, pool size > 0, idle <= open,
//!   addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`aws.rds.local` is empty")]
    MissingDsn,

    #[error("`database.connectAttempts` must be at least 1")]
    ZeroConnectAttempts,

    #[error("`database.maxIdleConns` ({idle}) exceeds `database.maxOpenConns` ({open})")]
    IdleExceedsOpen { idle: u32, open: u32 },

    #[error("`database.maxOpenConns` must be at least 1")]
    ZeroMaxOpen,

    #[error("`server.bindAddress` `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("`server.maxConnections` must be at least 1")]
    ZeroMaxConnections,

    #[error("`log.level` `{0}` is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("`log.maxSizeMb` must be at least 1")]
    ZeroLogSize,

    #[error("`log.file` is empty")]
    MissingLogFile,

    #[error("`aws.region` is empty")]
    MissingRegion,

    #[error("`metrics.address` `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.dsn.trim().is_empty() {
        errors.push(ValidationError::MissingDsn);
    }
    if config.database.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroConnectAttempts);
    }
    let pool = &config.database.pool;
    if pool.max_open > 0 && pool.max_idle > pool.max_open {
        errors.push(ValidationError::IdleExceedsOpen {
            idle: pool.max_idle,
            open: pool.max_open,
        });
    }
    if config.database.pool.max_open == 0 {
        errors.push(ValidationError::ZeroMaxOpen);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.log.level.clone()));
    }
    if config.log.max_size_mb == 0 {
        errors.push(ValidationError::ZeroLogSize);
    }
    if config.log.file.trim().is_empty() {
        errors.push(ValidationError::MissingLogFile);
    }

    if config.cloud.region.trim().is_empty() {
        errors.push(ValidationError::MissingRegion);
    }

    if config.metrics.enabled && config.metrics.socket_addr().is_none() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.metrics.address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
