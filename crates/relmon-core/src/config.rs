//! Configuration module for relmon.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation fallbacks, and documented defaults. All
//! values are read once at construction time; nothing is re-read at runtime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for relmon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub listener: ListenerConfig,
    pub reporting: ReportingConfig,
    pub logging: LoggingConfig,
}

/// Uevent matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Device path of the audio uevent node carrying microphone status
    /// markers. Board-specific; the default matches the reference hardware.
    pub audio_uevent_devpath: String,
    /// Sysfs root of the USB overheat-mitigation driver. Doubles as the
    /// devpath matched against overheat uevents and as the directory the
    /// temperature/timing attributes are read from.
    pub overheat_sysfs_root: PathBuf,
}

/// Statistics-collection service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Base URL of the statistics-collection service.
    pub endpoint: String,
    /// Per-request timeout in seconds for report delivery.
    pub timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `/etc/relmon/config.yaml`, or
    /// `$XDG_CONFIG_HOME/relmon/config.yaml` when running unprivileged.
    pub fn default_path() -> PathBuf {
        let system = PathBuf::from("/etc/relmon/config.yaml");
        if system.exists() {
            return system;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("relmon")
            .join("config.yaml")
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            audio_uevent_devpath: "/devices/virtual/amcs/amcs".to_string(),
            overheat_sysfs_root: PathBuf::from(
                "/sys/devices/platform/soc/soc:google,overheat_mitigation",
            ),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9880".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
