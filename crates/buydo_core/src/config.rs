//! Runtime configuration for the core.
//!
//! # Responsibility
//! - Carry host-provided paths, platform and tuning values.
//! - Load them from a JSON file with every field optional.
//!
//! # Invariants
//! - A validated config always has a non-empty key prefix and a parsable
//!   default reminder time.

use crate::logging::default_log_level;
use crate::repo::StorageKeys;
use crate::service::reminder_service::{parse_time_of_day, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "buydo_";
pub const DEFAULT_REMINDER_TIME: &str = "09:00";
pub const DEFAULT_REMINDER_MIN_LEAD_SECS: i64 = 60;
pub const MAX_REMINDER_MIN_LEAD_SECS: i64 = 86_400;
pub const DEFAULT_AUTOSAVE_QUIET_MS: u64 = 500;
const DB_FILE_NAME: &str = "buydo.sqlite3";
const LOG_DIR_NAME: &str = "logs";

/// Host platform, which decides reminder and attachment support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl Platform {
    /// Whether local notifications can be scheduled.
    pub fn supports_reminders(self) -> bool {
        !matches!(self, Self::Web)
    }

    /// Whether attachments are copied into the documents directory.
    pub fn supports_local_files(self) -> bool {
        !matches!(self, Self::Web)
    }

    /// Whether notifications need an explicit channel.
    pub fn needs_notification_channel(self) -> bool {
        matches!(self, Self::Android)
    }
}

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

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Core configuration. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// App documents root; attachments live under `<data_dir>/notes/`.
    pub data_dir: PathBuf,
    pub storage_key_prefix: String,
    pub platform: Platform,
    /// Used when a reminder is requested without a time.
    pub default_reminder_time: String,
    /// Minimum lead applied to reminders whose trigger already passed.
    pub reminder_min_lead_secs: i64,
    /// Quiet period before an editor autosave commits.
    pub autosave_quiet_ms: u64,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("buydo-data"),
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            platform: Platform::Ios,
            default_reminder_time: DEFAULT_REMINDER_TIME.to_string(),
            reminder_min_lead_secs: DEFAULT_REMINDER_MIN_LEAD_SECS,
            autosave_quiet_ms: DEFAULT_AUTOSAVE_QUIET_MS,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage_key_prefix must not be blank".to_string(),
            ));
        }
        if parse_time_of_day(&self.default_reminder_time).is_none() {
            return Err(ConfigError::Invalid(format!(
                "default_reminder_time `{}` is not 24h HH:MM",
                self.default_reminder_time
            )));
        }
        if !(1..=MAX_REMINDER_MIN_LEAD_SECS).contains(&self.reminder_min_lead_secs) {
            return Err(ConfigError::Invalid(format!(
                "reminder_min_lead_secs must be within 1..={MAX_REMINDER_MIN_LEAD_SECS}, got {}",
                self.reminder_min_lead_secs
            )));
        }
        Ok(())
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::new(self.storage_key_prefix.clone())
    }

    /// Default reminder time, falling back to 09:00 when misconfigured.
    pub fn default_time_of_day(&self) -> TimeOfDay {
        parse_time_of_day(&self.default_reminder_time).unwrap_or(TimeOfDay::NINE_AM)
    }

    /// SQLite record file inside `data_dir`.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, Platform};
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_dir": "/tmp/buydo", "platform": "android"}}"#).unwrap();

        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.storage_key_prefix, "buydo_");
        assert_eq!(config.default_reminder_time, "09:00");
        assert_eq!(config.autosave_quiet_ms, 500);
    }

    #[test]
    fn invalid_default_reminder_time_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_reminder_time": "25:00"}}"#).unwrap();

        let err = CoreConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reminder_lead_is_bounded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"reminder_min_lead_secs": 9223372036854775807}}"#).unwrap();
        assert!(matches!(
            CoreConfig::load(file.path()).unwrap_err(),
            ConfigError::Invalid(_)
        ));

        let day = CoreConfig {
            reminder_min_lead_secs: 86_400,
            ..CoreConfig::default()
        };
        assert!(day.validate().is_ok());
        let zero = CoreConfig {
            reminder_min_lead_secs: 0,
            ..CoreConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn web_platform_disables_reminders_and_files() {
        assert!(!Platform::Web.supports_reminders());
        assert!(!Platform::Web.supports_local_files());
        assert!(Platform::Android.needs_notification_channel());
        assert!(!Platform::Ios.needs_notification_channel());
    }
}
