//! Core runtime configuration.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - `max_history >= 1`.
//! - `log_dir`, when set, is absolute.

use crate::history::MAX_HISTORY_SIZE;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Startup configuration for an `AppContext`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    /// Log level; `default_log_level()` when unset.
    pub log_level: Option<String>,
    /// Absolute log directory. File logging is skipped when unset.
    pub log_dir: Option<PathBuf>,
    /// Undo stack bound.
    pub max_history: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: None,
            log_dir: None,
            max_history: MAX_HISTORY_SIZE,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::Invalid(
                "max_history must be at least 1".to_string(),
            ));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::history::MAX_HISTORY_SIZE;
    use std::path::PathBuf;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.max_history, MAX_HISTORY_SIZE);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn parses_every_field() {
        let config = CoreConfig::from_json_str(
            r#"{"db_path": "/tmp/gtd.sqlite3", "log_level": "warn", "log_dir": "/tmp/gtd-logs", "max_history": 10}"#,
        )
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/gtd.sqlite3")));
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert_eq!(config.max_history, 10);
    }

    #[test]
    fn rejects_zero_history_relative_log_dir_and_unknown_fields() {
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"max_history": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"log_dir": "logs"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"history": 5}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtd.json");
        std::fs::write(&path, r#"{"max_history": 3}"#).unwrap();

        assert_eq!(CoreConfig::from_file(&path).unwrap().max_history, 3);
        assert!(matches!(
            CoreConfig::from_file(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
