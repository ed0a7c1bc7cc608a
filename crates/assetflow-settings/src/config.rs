//! Pipeline configuration
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML files, stored wherever the caller likes or in the platform config
//! directory.
//!
//! Configuration is organized into sections:
//! - Loader settings (asset root, handler extensions)
//! - Watchdog settings
//! - Event bus settings

use assetflow_core::EventBusConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Supported file formats for config and manifest files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// Loader settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Directory resource sources are resolved against
    pub asset_root: PathBuf,
    /// Extensions handled by the image handler
    pub image_extensions: Vec<String>,
    /// Extensions handled by the model handler
    pub model_extensions: Vec<String>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            image_extensions: vec!["jpg".to_string(), "png".to_string()],
            model_extensions: vec!["glb".to_string(), "gltf".to_string()],
        }
    }
}

/// Watchdog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogSettings {
    /// Arm a watchdog on every run
    pub enabled: bool,
    /// Milliseconds before the watchdog fires
    pub timeout_ms: u64,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 15_000,
        }
    }
}

impl WatchdogSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Event bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Capacity of the async receiver channel
    pub channel_capacity: usize,
    /// Keep a history of published events
    pub enable_history: bool,
    /// Maximum number of events kept in history
    pub max_history_size: usize,
    /// Seconds events are kept in history
    pub history_retention_secs: u64,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            enable_history: false,
            max_history_size: 1000,
            history_retention_secs: 300,
        }
    }
}

impl From<&EventSettings> for EventBusConfig {
    fn from(settings: &EventSettings) -> Self {
        EventBusConfig {
            channel_capacity: settings.channel_capacity,
            enable_history: settings.enable_history,
            max_history_size: settings.max_history_size,
            history_retention: Duration::from_secs(settings.history_retention_secs),
        }
    }
}

/// Complete pipeline configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Loader settings
    #[serde(default)]
    pub loader: LoaderSettings,
    /// Watchdog settings
    #[serde(default)]
    pub watchdog: WatchdogSettings,
    /// Event bus settings
    #[serde(default)]
    pub events: EventSettings,
}

impl PipelineConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location in the platform config directory
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("assetflow").join("pipeline.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match FileFormat::from_path(path)? {
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved pipeline config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        check_extensions("loader.image_extensions", &self.loader.image_extensions)?;
        check_extensions("loader.model_extensions", &self.loader.model_extensions)?;

        if self.watchdog.enabled && self.watchdog.timeout_ms == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "watchdog.timeout_ms".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.events.channel_capacity == 0 {
            return Err(SettingsError::invalid(
                "events.channel_capacity",
                "must be > 0",
            ));
        }

        if self.events.enable_history && self.events.max_history_size == 0 {
            return Err(SettingsError::invalid(
                "events.max_history_size",
                "must be > 0 when history is enabled",
            ));
        }

        Ok(())
    }

    /// Event bus configuration derived from the `events` section
    pub fn event_bus_config(&self) -> EventBusConfig {
        EventBusConfig::from(&self.events)
    }
}

// Extensions are matched against lowercase letters only.
fn check_extensions(key: &str, extensions: &[String]) -> SettingsResult<()> {
    if extensions.is_empty() {
        return Err(SettingsError::invalid(key, "must not be empty"));
    }
    if let Some(bad) = extensions
        .iter()
        .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_lowercase()))
    {
        return Err(SettingsError::invalid(
            key,
            format!("'{}' is not a lowercase extension", bad),
        ));
    }
    Ok(())
}
