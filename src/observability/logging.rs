//! Structured logging.
//!
//! # Responsibilities
//! - Emit JSON lines to stdout and to a size-rotated log file
//! - Tag each event with the source file and line of its call site
//! - Prune rotated files past their maximum age at startup
//!
//! `RUST_LOG` takes precedence over `log.level`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use thiserror::Error;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid log level: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("logger already installed: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_ascii_lowercase()))?;

    let path = PathBuf::from(&config.file);
    let pruned = prune_expired(&path, config.max_age());
    let file = Mutex::new(rotating_file(config)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_current_span(true)
                .with_writer(io::stdout.and(file)),
        )
        .try_init()?;

    match pruned {
        Ok(pruned) => tracing::debug!(file = %path.display(), pruned, "Logging initialized"),
        Err(e) => tracing::warn!(
            file = %path.display(),
            error = %e,
            "Logging initialized, but expired log files could not be pruned"
        ),
    }
    Ok(())
}

/// Open the log file, rotating at `max_size_mb` and keeping `max_backups`
/// rotated copies (`app.log.1`, `app.log.2`, ...).
pub fn rotating_file(config: &LogConfig) -> Result<FileRotate<AppendCount>, LoggingError> {
    let path = PathBuf::from(&config.file);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let max_files = match config.max_backups {
        0 => usize::MAX,
        n => usize::try_from(n).unwrap_or(usize::MAX),
    };
    let max_bytes = config.max_size_mb.max(1).saturating_mul(BYTES_PER_MB);
    let compression = if config.compress {
        Compression::OnRotate(0)
    } else {
        Compression::None
    };

    Ok(FileRotate::new(
        path,
        AppendCount::new(max_files),
        ContentLimit::Bytes(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        compression,
        #[cfg(unix)]
        None,
    ))
}

/// Delete rotated siblings of `path` older than `max_age`. The active file is
/// never touched. Zero `max_age` disables pruning.
pub fn prune_expired(path: &Path, max_age: Duration) -> io::Result<usize> {
    if max_age.is_zero() {
        return Ok(0);
    }
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(0);
    };
    let prefix = format!("{file_name}.");
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(&prefix) {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
