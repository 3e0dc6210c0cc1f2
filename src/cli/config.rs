//! Settings Store
//!
//! Typed settings consulted by the prompt driver on every cycle. Settings are
//! persisted as a flat JSON object keyed by dotted setting names; unknown keys
//! are ignored and missing keys take their defaults.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use strum_macros::{AsRefStr, EnumString};

/// Case sensitivity used when comparing completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IgnoreCase {
    Off,
    On,
    Relaxed,
}

/// When the previous prompt may be collapsed into its transient form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransientMode {
    Off,
    Always,
    SameDir,
}

/// A single setting value as seen through [`SettingsStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Enum(String),
    Str(String),
    Map(Vec<(String, String)>),
}

/// Persistent settings collaborator.
pub trait SettingsStore {
    /// Reload from `path`. A missing file leaves the current values in place.
    fn load(&mut self, path: &Path) -> Result<(), SettingsError>;

    /// Look up a setting by its dotted name.
    fn get(&self, name: &str) -> Option<SettingValue>;

    fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            SettingValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            SettingValue::Int(value) => Some(value),
            _ => None,
        }
    }

    /// Enum settings are returned by value name and parsed by the caller.
    fn get_enum(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            SettingValue::Enum(value) => Some(value),
            _ => None,
        }
    }

    fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            SettingValue::Str(value) => Some(value),
            _ => None,
        }
    }

    fn get_map(&self, name: &str) -> Option<Vec<(String, String)>> {
        match self.get(name)? {
            SettingValue::Map(value) => Some(value),
            _ => None,
        }
    }
}

/// Settings backed by a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(rename = "match.ignore_case")]
    pub ignore_case: IgnoreCase,
    #[serde(rename = "match.ignore_accent")]
    pub ignore_accent: bool,
    #[serde(rename = "prompt.filter")]
    pub prompt_filter: bool,
    #[serde(rename = "prompt.transient")]
    pub transient: TransientMode,
    #[serde(rename = "history.save")]
    pub save_history: bool,
    #[serde(rename = "history.dont_add_to_history_cmds")]
    pub dont_add_to_history_cmds: String,
    #[serde(rename = "history.sticky_search")]
    pub sticky_search: bool,
    #[serde(rename = "history.max_lines")]
    pub max_history_size: usize,
    #[serde(rename = "scripts.reload")]
    pub reload_scripts: bool,
    #[serde(rename = "scripts.path")]
    pub script_path: String,
    #[serde(rename = "cmd.get_errorlevel")]
    pub get_errorlevel: bool,
    #[serde(rename = "input.colorize")]
    pub colorize_input: bool,
    #[serde(rename = "prompt.autostart")]
    pub autostart: String,
    #[serde(rename = "log.level")]
    pub log_level: String,
    #[serde(rename = "doskey.aliases")]
    pub aliases: BTreeMap<String, String>,
    pub key_bindings: BTreeMap<String, String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ignore_case: IgnoreCase::Relaxed,
            ignore_accent: true,
            prompt_filter: true,
            transient: TransientMode::Off,
            save_history: true,
            dont_add_to_history_cmds: "exit history".to_string(),
            sticky_search: false,
            max_history_size: 10000,
            reload_scripts: false,
            script_path: String::new(),
            get_errorlevel: true,
            colorize_input: true,
            autostart: String::new(),
            log_level: "info".to_string(),
            aliases: BTreeMap::new(),
            key_bindings: BTreeMap::new(),
        }
    }
}

impl CliConfig {
    /// Create a configuration holding the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Set a scalar setting from its textual form
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let as_bool = || match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(true),
            "0" | "false" | "off" | "no" => Ok(false),
            _ => Err(invalid()),
        };

        match name {
            "match.ignore_case" => self.ignore_case = IgnoreCase::from_str(value).map_err(|_| invalid())?,
            "match.ignore_accent" => self.ignore_accent = as_bool()?,
            "prompt.filter" => self.prompt_filter = as_bool()?,
            "prompt.transient" => self.transient = TransientMode::from_str(value).map_err(|_| invalid())?,
            "history.save" => self.save_history = as_bool()?,
            "history.dont_add_to_history_cmds" => self.dont_add_to_history_cmds = value.to_string(),
            "history.sticky_search" => self.sticky_search = as_bool()?,
            "history.max_lines" => self.max_history_size = value.trim().parse().map_err(|_| invalid())?,
            "scripts.reload" => self.reload_scripts = as_bool()?,
            "scripts.path" => self.script_path = value.to_string(),
            "cmd.get_errorlevel" => self.get_errorlevel = as_bool()?,
            "input.colorize" => self.colorize_input = as_bool()?,
            "prompt.autostart" => self.autostart = value.to_string(),
            "log.level" => self.log_level = value.to_string(),
            _ => return Err(SettingsError::UnknownSetting(name.to_string())),
        }
        Ok(())
    }
}

impl SettingsStore for CliConfig {
    fn load(&mut self, path: &Path) -> Result<(), SettingsError> {
        if !path.exists() {
            return Ok(());
        }
        let text = fs::read_to_string(path)?;
        *self = serde_json::from_str(&text)?;
        Ok(())
    }

    fn get(&self, name: &str) -> Option<SettingValue> {
        let map = |m: &BTreeMap<String, String>| {
            SettingValue::Map(m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        };
        let value = match name {
            "match.ignore_case" => SettingValue::Enum(self.ignore_case.as_ref().to_string()),
            "match.ignore_accent" => SettingValue::Bool(self.ignore_accent),
            "prompt.filter" => SettingValue::Bool(self.prompt_filter),
            "prompt.transient" => SettingValue::Enum(self.transient.as_ref().to_string()),
            "history.save" => SettingValue::Bool(self.save_history),
            "history.dont_add_to_history_cmds" => SettingValue::Str(self.dont_add_to_history_cmds.clone()),
            "history.sticky_search" => SettingValue::Bool(self.sticky_search),
            "history.max_lines" => SettingValue::Int(self.max_history_size as i64),
            "scripts.reload" => SettingValue::Bool(self.reload_scripts),
            "scripts.path" => SettingValue::Str(self.script_path.clone()),
            "cmd.get_errorlevel" => SettingValue::Bool(self.get_errorlevel),
            "input.colorize" => SettingValue::Bool(self.colorize_input),
            "prompt.autostart" => SettingValue::Str(self.autostart.clone()),
            "log.level" => SettingValue::Str(self.log_level.clone()),
            "doskey.aliases" => map(&self.aliases),
            "key_bindings" => map(&self.key_bindings),
            _ => return None,
        };
        Some(value)
    }
}
