//! Runtime configuration resolved from `FOLIO_*` environment variables.
//!
//! Unset variables fall back to defaults (logged at info); set but
//! unparsable values are rejected instead of silently defaulted.

use crate::attachment::policy::{AttachmentPolicy, DEFAULT_MAX_UPLOAD_BYTES};
use crate::logging::default_log_level;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "FOLIO_DB_PATH";
pub const ENV_UPLOADS_DIR: &str = "FOLIO_UPLOADS_DIR";
pub const ENV_LOG_LEVEL: &str = "FOLIO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FOLIO_LOG_DIR";
pub const ENV_MAX_UPLOAD_BYTES: &str = "FOLIO_MAX_UPLOAD_BYTES";

const DEFAULT_DB_FILE: &str = "portfolio.db";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Paths and limits used to wire stores, file storage and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolioConfig {
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub log_level: String,
    /// Must be absolute; relative inputs are resolved against the working
    /// directory.
    pub log_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl FolioConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str, default: &str| -> String {
            match lookup(key).filter(|value| !value.trim().is_empty()) {
                Some(value) => value.trim().to_string(),
                None => {
                    info!("event=config_default module=config key={key} default={default}");
                    default.to_string()
                }
            }
        };

        let max_upload_raw = read(ENV_MAX_UPLOAD_BYTES, &DEFAULT_MAX_UPLOAD_BYTES.to_string());
        let max_upload_bytes = max_upload_raw
            .parse::<u64>()
            .ok()
            .filter(|bytes| *bytes > 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_MAX_UPLOAD_BYTES,
                value: max_upload_raw.clone(),
                reason: "expected a positive byte count".to_string(),
            })?;

        let log_level = read(ENV_LOG_LEVEL, default_log_level()).to_ascii_lowercase();
        if !matches!(
            log_level.as_str(),
            "trace" | "debug" | "info" | "warn" | "warning" | "error"
        ) {
            return Err(ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                value: log_level,
                reason: "expected trace|debug|info|warn|error".to_string(),
            });
        }

        Ok(Self {
            db_path: PathBuf::from(read(ENV_DB_PATH, DEFAULT_DB_FILE)),
            uploads_dir: PathBuf::from(read(ENV_UPLOADS_DIR, DEFAULT_UPLOADS_DIR)),
            log_level,
            log_dir: absolutize(PathBuf::from(read(ENV_LOG_DIR, DEFAULT_LOG_DIR_NAME))),
            max_upload_bytes,
        })
    }

    /// Replaces the log directory; relative paths resolve against the
    /// working directory, as they do when read from the environment.
    pub fn set_log_dir(&mut self, path: impl Into<PathBuf>) {
        self.log_dir = absolutize(path.into());
    }

    /// Profile-picture policy with the configured upload ceiling.
    pub fn profile_picture_policy(&self) -> AttachmentPolicy {
        AttachmentPolicy::profile_picture().with_max_bytes(self.max_upload_bytes)
    }

    /// Project-media policy with the configured upload ceiling.
    pub fn project_media_policy(&self) -> AttachmentPolicy {
        AttachmentPolicy::project_media().with_max_bytes(self.max_upload_bytes)
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => std::env::temp_dir().join(path),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FolioConfig, ENV_LOG_LEVEL, ENV_MAX_UPLOAD_BYTES, ENV_UPLOADS_DIR};
    use crate::attachment::policy::DEFAULT_MAX_UPLOAD_BYTES;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<FolioConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        FolioConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("portfolio.db"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.log_dir.is_absolute());
    }

    #[test]
    fn overrides_are_trimmed_and_applied() {
        let config = config_from(&[
            (ENV_UPLOADS_DIR, " /srv/uploads "),
            (ENV_MAX_UPLOAD_BYTES, "1024"),
            (ENV_LOG_LEVEL, "WARN"),
        ])
        .unwrap();
        assert_eq!(config.uploads_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.profile_picture_policy().max_bytes, 1024);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn log_dir_override_is_made_absolute() {
        let mut config = config_from(&[]).unwrap();
        config.set_log_dir("var/logs");
        assert!(config.log_dir.is_absolute());
        assert!(config.log_dir.ends_with("var/logs"));

        config.set_log_dir("/tmp/folio-logs");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/folio-logs"));
    }

    #[test]
    fn unparsable_values_are_rejected() {
        let err = config_from(&[(ENV_MAX_UPLOAD_BYTES, "five")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_MAX_UPLOAD_BYTES,
                ..
            }
        ));
        assert!(config_from(&[(ENV_LOG_LEVEL, "loud")]).is_err());
    }
}
