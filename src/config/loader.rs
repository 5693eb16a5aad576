//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::store::ConfigStore;
use crate::config::validation::{validate_config, ValidationError};

/// Base name of the configuration file.
pub const CONFIG_NAME: &str = "config";

const CONFIG_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config.yaml or config.yml in {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{} must contain a mapping at the top level", .0.display())]
    NotAMapping(PathBuf),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find `config.yaml` (or `config.yml`) in `dir`.
pub fn locate_config(dir: &Path) -> Result<PathBuf, ConfigError> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{CONFIG_NAME}.{ext}")))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))
}

/// Parse a configuration file into a key store. An empty file is an empty
/// store.
pub fn load_store(path: &Path) -> Result<ConfigStore, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match root {
        Value::Mapping(_) | Value::Null => Ok(ConfigStore::new(root)),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

/// Locate, load and validate configuration from `dir`.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = locate_config(dir)?;
    let store = load_store(&path)?;
    let config = AppConfig::from_store(&store);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_config(dir.path()), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config.yaml", "aws: [unclosed");
        assert!(matches!(load_config(dir.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn top_level_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config.yaml", "- a\n- b\n");
        assert!(matches!(load_config(dir.path()), Err(ConfigError::NotAMapping(_))));
    }

    #[test]
    fn yml_extension_is_found() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "config.yml",
            "aws:\n  rds:\n    local: postgres://localhost/auth\nfiber:\n  idleTimeout: 30s\n",
        );
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.database.dsn, "postgres://localhost/auth");
        assert_eq!(config.server.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.server.app_name, "");
    }

    #[test]
    fn validation_errors_are_joined() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config.yaml", "database:\n  connectAttempts: 0\n");
        let err = load_config(dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: `aws.rds.local` is empty, `database.connectAttempts` must be at least 1"
        );
    }
}
