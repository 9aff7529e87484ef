use crate::notify::Permission;
use crate::reminder::{DEFAULT_LEAD_MINUTES, DEFAULT_TICK_SECONDS};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings read from `~/.config/taskdeck/config.toml`. The file is
/// optional; a missing file means defaults, a malformed one is a
/// startup error.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub reminders: ReminderConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReminderConfig {
    /// Seconds between due-time scans.
    pub tick_seconds: u64,
    /// How far ahead of the due instant a reminder fires, in minutes.
    pub lead_minutes: i64,
    /// Startup notification permission: "ask", "granted", or "denied".
    pub notifications: NotificationSetting,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSetting {
    #[default]
    Ask,
    Granted,
    Denied,
}

impl NotificationSetting {
    pub fn permission(self) -> Permission {
        match self {
            NotificationSetting::Ask => Permission::Default,
            NotificationSetting::Granted => Permission::Granted,
            NotificationSetting::Denied => Permission::Denied,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reminders: ReminderConfig::default(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        ReminderConfig {
            tick_seconds: DEFAULT_TICK_SECONDS,
            lead_minutes: DEFAULT_LEAD_MINUTES,
            notifications: NotificationSetting::default(),
        }
    }
}

impl Config {
    /// Load from the user config directory, falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskdeck").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reminders.tick_seconds, 60);
        assert_eq!(config.reminders.lead_minutes, 5);
        assert_eq!(config.reminders.notifications, NotificationSetting::Ask);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [reminders]
            lead_minutes = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.reminders.lead_minutes, 10);
        assert_eq!(config.reminders.tick_seconds, 60);
    }

    #[test]
    fn test_notification_setting_parses() {
        let config: Config = toml::from_str(
            r#"
            [reminders]
            notifications = "denied"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.reminders.notifications.permission(),
            Permission::Denied
        );
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let err = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(matches!(err, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_from_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "reminders = 12").unwrap();
        let err = Config::load_from(file.path());
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }
}
