//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session durations and long-break cadence
//! - Notification preferences
//! - Auto-advance behavior for the watch loop
//!
//! Configuration is stored at `~/.config/tomatick/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, ValidationError};

/// Session durations and cadence, the timer's only configuration input.
///
/// Immutable during an active countdown by construction: the engine only
/// re-reads it on a mode switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Number of Work sessions between consecutive long breaks; 1 means a
    /// long break after every Work session.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    /// Display-only target; never enforced as a stop.
    #[serde(default = "default_target_session_count")]
    pub target_session_count: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_50")]
    pub volume: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tomatick/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Whether the watch loop starts the next countdown after a completion.
    /// The mode advances either way.
    #[serde(default = "default_true")]
    pub auto_advance: bool,
}

// Default functions
fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_target_session_count() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_50() -> u32 {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_interval: default_long_break_interval(),
            target_session_count: default_target_session_count(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 50,
            sound_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            notifications: NotificationsConfig::default(),
            auto_advance: true,
        }
    }
}

impl SessionConfig {
    /// All durations and counts must be positive integers.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("session.work_minutes", self.work_minutes),
            ("session.short_break_minutes", self.short_break_minutes),
            ("session.long_break_minutes", self.long_break_minutes),
            ("session.long_break_interval", self.long_break_interval),
            ("session.target_session_count", self.target_session_count),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(invalid("config key is empty".into()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| invalid("unknown config key".into()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| invalid("unknown config key".into()))?;
        }

        Err(invalid("unknown config key".into()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/tomatick"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, validate, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the resulting session settings are invalid, or the config cannot be
    /// saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated
            .session
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        *self = updated;
        self.save()?;
        Ok(())
    }
}

/// Configuration collaborator: whatever hands the timer its current
/// session settings.
pub trait ConfigSource {
    fn current(&self) -> SessionConfig;
}

/// Fixed settings, for tests and embedding.
impl ConfigSource for SessionConfig {
    fn current(&self) -> SessionConfig {
        self.clone()
    }
}

/// File-backed source. Re-reads the file on every call, so a settings
/// change lands at the next mode switch, never mid-countdown.
pub struct ConfigFile;

impl ConfigSource for ConfigFile {
    fn current(&self) -> SessionConfig {
        Config::load_or_default().session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.session.work_minutes, 25);
        assert_eq!(parsed.notifications.volume, 50);
        assert!(parsed.auto_advance);
    }

    #[test]
    fn partial_toml_fills_field_defaults() {
        let parsed: Config = toml::from_str("[session]\nwork_minutes = 50\n").unwrap();
        assert_eq!(parsed.session.work_minutes, 50);
        assert_eq!(parsed.session.short_break_minutes, 5);
        assert_eq!(parsed.session.long_break_interval, 4);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("auto_advance").as_deref(), Some("true"));
        assert!(cfg.get("session.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "session.long_break_interval", "1").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "session.long_break_interval").unwrap(),
            &serde_json::Value::Number(1.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(Config::set_json_value_by_path(&mut json, "session.nonexistent", "3").is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(Config::set_json_value_by_path(&mut json, "auto_advance", "not_a_bool").is_err());
    }

    #[test]
    fn validate_rejects_zero_values() {
        let cfg = SessionConfig {
            long_break_interval: 0,
            ..SessionConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SessionConfig {
            work_minutes: 0,
            ..SessionConfig::default()
        };
        assert!(cfg.validate().is_err());

        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn session_config_source_returns_itself() {
        let cfg = SessionConfig {
            work_minutes: 50,
            ..SessionConfig::default()
        };
        assert_eq!(cfg.current(), cfg);
    }
}
