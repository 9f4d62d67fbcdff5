//! Controller configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DeepWorkResult;
use crate::logging::LogFormat;

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Directory holding the persisted focus state
    pub data_dir: PathBuf,

    /// File name of the persisted focus state inside `data_dir`
    pub state_file: String,

    /// Stylesheet injected into every eligible page while focus mode is on
    pub stylesheet: String,

    /// Badge settings
    pub badge: BadgeConfig,

    /// Session summary notification settings
    pub notification: NotificationConfig,

    /// Upper bound for a single platform call during a transition (none when absent)
    pub step_timeout_ms: Option<u64>,

    /// Log filter directive (e.g. "deepwork=debug"), falls back to RUST_LOG
    pub log_filter: Option<String>,

    /// Log output format: "pretty", "compact" or "json"
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BadgeConfig {
    /// Badge text while focus mode is on
    pub text: String,

    /// Badge background while focus mode is on
    pub active_color: String,

    /// Badge background while focus mode is off
    pub idle_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    pub icon_url: String,
    pub priority: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("deepwork"),
            state_file: "focus_state.json".to_string(),
            stylesheet: "styles.css".to_string(),
            badge: BadgeConfig::default(),
            notification: NotificationConfig::default(),
            step_timeout_ms: None,
            log_filter: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            text: "ON".to_string(),
            active_color: "#7c4dff".to_string(),
            idle_color: "#000000".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Focus Session Complete".to_string(),
            icon_url: "icon.svg".to_string(),
            priority: 2,
        }
    }
}

impl ControllerConfig {
    /// Load config from file, falling back to defaults when missing or unreadable
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid config, using defaults")
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config, using defaults")
            }
        }
        Self::default()
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> DeepWorkResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Full path of the persisted focus state file
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.state_file)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }
}
