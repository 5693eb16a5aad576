//! Typed configuration sections.
//!
//! Every section is built from a [`ConfigStore`]. Keys the service has always
//! hard-coded (pool sizes, retry count, log rotation, AWS region) fall back to
//! the constants below when absent; every other key keeps its zero value.

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::store::ConfigStore;

pub const DEFAULT_MAX_OPEN_CONNS: u32 = 100;
pub const DEFAULT_MAX_IDLE_CONNS: u32 = 10;
pub const DEFAULT_CONN_MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CONN_MAX_IDLE_TIME: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_CLOUD_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_LOG_FILE: &str = "./logs/app.log";
pub const DEFAULT_LOG_MAX_SIZE_MB: u64 = 100;
pub const DEFAULT_LOG_MAX_BACKUPS: u64 = 3;
pub const DEFAULT_LOG_MAX_AGE_DAYS: u64 = 28;
pub const DEFAULT_METRICS_ADDRESS: &str = "0.0.0.0:9090";

/// Root configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database DSN, pool limits and connect retry policy.
    pub database: DatabaseConfig,

    /// HTTP server shell options (`fiber.*`).
    pub server: ServerConfig,

    /// Bind address and connection limits.
    pub listener: ListenerConfig,

    /// Log output and file rotation.
    pub log: LogConfig,

    /// Shared AWS configuration.
    pub cloud: CloudConfig,

    /// Prometheus exporter.
    pub metrics: MetricsConfig,
}

impl AppConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            database: DatabaseConfig::from_store(store),
            server: ServerConfig::from_store(store),
            listener: ListenerConfig::from_store(store),
            log: LogConfig::from_store(store),
            cloud: CloudConfig::from_store(store),
            metrics: MetricsConfig::from_store(store),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_store(&ConfigStore::default())
    }
}

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string (`aws.rds.local`).
    pub dsn: String,

    pub pool: PoolConfig,

    /// Policy for establishing the initial connection.
    pub retry: RetryConfig,
}

impl DatabaseConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            dsn: store.get_string("aws.rds.local"),
            pool: PoolConfig {
                max_open: store.u32_or("database.maxOpenConns", DEFAULT_MAX_OPEN_CONNS),
                max_idle: store.u32_or("database.maxIdleConns", DEFAULT_MAX_IDLE_CONNS),
                max_lifetime: store
                    .duration_or("database.connMaxLifetime", DEFAULT_CONN_MAX_LIFETIME),
                max_idle_time: store
                    .duration_or("database.connMaxIdleTime", DEFAULT_CONN_MAX_IDLE_TIME),
                acquire_timeout: store
                    .duration_or("database.acquireTimeout", DEFAULT_ACQUIRE_TIMEOUT),
            },
            retry: RetryConfig {
                max_attempts: store.u32_or("database.connectAttempts", DEFAULT_CONNECT_ATTEMPTS),
                base_delay: store.duration_or("database.retryBaseDelay", DEFAULT_RETRY_BASE_DELAY),
                max_delay: store.duration_or("database.retryMaxDelay", DEFAULT_RETRY_MAX_DELAY),
            },
        }
    }
}

/// Connection pool limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum open connections.
    pub max_open: u32,

    /// Idle connections retained by the pool (clamped to `max_open`).
    pub max_idle: u32,

    /// Maximum lifetime of a single connection. Zero means unlimited.
    pub max_lifetime: Duration,

    /// Idle connections above `max_idle` are closed after this long. Zero
    /// means never.
    pub max_idle_time: Duration,

    /// How long a caller waits to check out a connection.
    pub acquire_timeout: Duration,
}

/// Retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles on each further attempt.
    pub base_delay: Duration,

    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

/// HTTP server shell options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub disable_startup_message: bool,
    pub prefork: bool,
    pub case_sensitive: bool,
    pub strict_routing: bool,
    pub server_header: String,
    pub app_name: String,
    pub idle_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl ServerConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            disable_startup_message: store.get_bool("fiber.disableStartupMessage"),
            prefork: store.get_bool("fiber.prefork"),
            case_sensitive: store.get_bool("fiber.caseSensitive"),
            strict_routing: store.get_bool("fiber.strictRouting"),
            server_header: store.get_string("fiber.serverHeader"),
            app_name: store.get_string("fiber.appName"),
            idle_timeout: store.get_duration("fiber.idleTimeout"),
            read_timeout: store.get_duration("fiber.readTimeout"),
            write_timeout: store.get_duration("fiber.writeTimeout"),
        }
    }

    /// Keep-alive idle limit. Falls back to the read timeout when unset;
    /// `None` when both are zero.
    pub fn effective_idle_timeout(&self) -> Option<Duration> {
        [self.idle_timeout, self.read_timeout]
            .into_iter()
            .find(|d| !d.is_zero())
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// How long in-flight connections may drain after shutdown.
    pub shutdown_timeout: Duration,
}

impl ListenerConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            bind_address: store.string_or("server.bindAddress", DEFAULT_BIND_ADDRESS),
            max_connections: store.usize_or("server.maxConnections", DEFAULT_MAX_CONNECTIONS),
            shutdown_timeout: store.duration_or("server.shutdownTimeout", DEFAULT_SHUTDOWN_TIMEOUT),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub level: String,

    /// Active log file; rotated files sit next to it.
    pub file: String,

    pub max_size_mb: u64,

    /// Rotated files kept. Zero keeps all of them.
    pub max_backups: u64,

    /// Rotated files older than this many days are pruned. Zero disables.
    pub max_age_days: u64,

    /// Gzip rotated files.
    pub compress: bool,
}

impl LogConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            level: store.string_or("log.level", DEFAULT_LOG_LEVEL),
            file: store.string_or("log.file", DEFAULT_LOG_FILE),
            max_size_mb: store.u64_or("log.maxSizeMb", DEFAULT_LOG_MAX_SIZE_MB),
            max_backups: store.u64_or("log.maxBackups", DEFAULT_LOG_MAX_BACKUPS),
            max_age_days: store.u64_or("log.maxAgeDays", DEFAULT_LOG_MAX_AGE_DAYS),
            compress: store.bool_or("log.compress", true),
        }
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days.saturating_mul(24 * 60 * 60))
    }
}

/// Shared AWS configuration.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub region: String,

    /// Upper bound for loading credentials and settings. Zero disables.
    pub load_timeout: Duration,
}

impl CloudConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            region: store.string_or("aws.region", DEFAULT_REGION),
            load_timeout: store.duration_or("aws.loadTimeout", DEFAULT_CLOUD_LOAD_TIMEOUT),
        }
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,

    /// Scrape endpoint bind address.
    pub address: String,
}

impl MetricsConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            enabled: store.get_bool("metrics.enabled"),
            address: store.string_or("metrics.address", DEFAULT_METRICS_ADDRESS),
        }
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address.parse().ok()
    }
}
