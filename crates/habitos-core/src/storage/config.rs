//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The UTC offset used to resolve the local calendar day
//! - The default category for new habits
//!
//! Configuration is stored at `~/.config/habitos/config.toml`.

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habitos/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Offset from UTC, in whole hours, used to resolve "today".
    /// Check-ins are keyed by calendar day, so this decides when one
    /// day ends and the next begins.
    #[serde(default)]
    pub timezone_offset_hours: i32,
    /// Category assigned to new habits when none is given.
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_category() -> String {
    "personal".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone_offset_hours: 0,
            default_category: default_category(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
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
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// The local calendar day, per the configured UTC offset.
    pub fn today(&self) -> NaiveDate {
        let offset = FixedOffset::east_opt(self.timezone_offset_hours * 3600)
            .unwrap_or(FixedOffset::east_opt(0).expect("zero offset is valid"));
        Utc::now().with_timezone(&offset).date_naive()
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist. The new value must parse as
    /// the field's existing type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::ParseFailed("config is not a table".into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::ParseFailed(format!("unknown config key: {key}")))?;

        let new_value = match existing {
            serde_json::Value::Number(_) => value
                .parse::<i64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| ConfigError::ParseFailed(format!("cannot parse '{value}' as number")))?,
            serde_json::Value::Bool(_) => value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| ConfigError::ParseFailed(format!("cannot parse '{value}' as bool")))?,
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(key.to_string(), new_value);

        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        self.save()?;
        Ok(())
    }

    /// Reject values `today()` could not honor.
    fn validate(&self) -> Result<()> {
        if !(-23..=23).contains(&self.timezone_offset_hours) {
            return Err(ConfigError::ParseFailed(format!(
                "timezone_offset_hours must be between -23 and 23 (got {})",
                self.timezone_offset_hours
            ))
            .into());
        }
        Ok(())
    }
}
