use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::disk_monitor::Thresholds;
use crate::error::SdmError;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Percent used at which a critical alert is raised
    pub critical_threshold: u8,
    /// Percent used at which a warning is raised
    pub warning_threshold: u8,
    /// Percent used at which a notice is raised
    pub notice_threshold: u8,
    /// Minutes between two checks
    pub check_interval: f64,
    /// Mount points to watch; empty means every available volume
    pub drives_to_monitor: Vec<String>,
    pub silent_mode: bool,
    pub run_at_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            critical_threshold: thresholds.critical,
            warning_threshold: thresholds.warning,
            notice_threshold: thresholds.notice,
            check_interval: 5.0,
            drives_to_monitor: Vec::new(),
            silent_mode: false,
            run_at_startup: false,
        }
    }
}

/// A requested change to the configuration. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub notice_threshold: Option<u8>,
    pub warning_threshold: Option<u8>,
    pub critical_threshold: Option<u8>,
    pub check_interval: Option<f64>,
    pub drives_to_monitor: Option<Vec<String>>,
    pub silent_mode: Option<bool>,
    pub run_at_startup: Option<bool>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.notice_threshold.is_none()
            && self.warning_threshold.is_none()
            && self.critical_threshold.is_none()
            && self.check_interval.is_none()
            && self.drives_to_monitor.is_none()
            && self.silent_mode.is_none()
            && self.run_at_startup.is_none()
    }
}

impl Config {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            notice: self.notice_threshold,
            warning: self.warning_threshold,
            critical: self.critical_threshold,
        }
    }

    /// Time to wait between two polls.
    pub fn check_interval(&self) -> Duration {
        if self.check_interval.is_finite() && self.check_interval > 0.0 {
            Duration::from_secs_f64(self.check_interval * 60.0)
        } else {
            Duration::from_secs_f64(Config::default().check_interval * 60.0)
        }
    }

    /// Check the threshold ordering and the interval.
    pub fn validate(&self) -> crate::Result<()> {
        let t = self.thresholds();

        if t.notice == 0 {
            return Err(SdmError::validation("notice threshold must be greater than 0"));
        }
        if t.critical > 100 {
            return Err(SdmError::validation(format!(
                "critical threshold must be at most 100 (got {})",
                t.critical
            )));
        }
        if !(t.notice < t.warning && t.warning < t.critical) {
            return Err(SdmError::validation(format!(
                "thresholds must satisfy notice < warning < critical (got {} / {} / {})",
                t.notice, t.warning, t.critical
            )));
        }
        if !self.check_interval.is_finite() || self.check_interval <= 0.0 {
            return Err(SdmError::validation(format!(
                "check interval must be a positive number of minutes (got {})",
                self.check_interval
            )));
        }

        Ok(())
    }

    /// Apply `update` to a copy of this config and validate the result.
    ///
    /// On error `self` is untouched and stays the config in effect.
    pub fn with_update(&self, update: &ConfigUpdate) -> crate::Result<Config> {
        let mut next = self.clone();

        if let Some(v) = update.notice_threshold {
            next.notice_threshold = v;
        }
        if let Some(v) = update.warning_threshold {
            next.warning_threshold = v;
        }
        if let Some(v) = update.critical_threshold {
            next.critical_threshold = v;
        }
        if let Some(v) = update.check_interval {
            next.check_interval = v;
        }
        if let Some(ref drives) = update.drives_to_monitor {
            next.drives_to_monitor = drives
                .iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
        }
        if let Some(v) = update.silent_mode {
            next.silent_mode = v;
        }
        if let Some(v) = update.run_at_startup {
            next.run_at_startup = v;
        }

        next.validate()?;
        Ok(next)
    }
}

/// Persists [`Config`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform config directory, e.g. `~/.config/sdm/config.json`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("sdm").join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, falling back to defaults on any problem.
    ///
    /// A missing file is created with the defaults. Unreadable, corrupt or
    /// invalid files are logged and replaced by defaults in memory only.
    pub fn load(&self) -> Config {
        if !self.path.exists() {
            let config = Config::default();
            match self.save(&config) {
                Ok(()) => log::info!("Created default config file: {:?}", self.path),
                Err(e) => log::error!("Could not create config file {:?}: {:#}", self.path, e),
            }
            return config;
        }

        match self.read() {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    log::info!("Loaded config file: {:?}", self.path);
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring config file {:?}: {}", self.path, e);
                    Config::default()
                }
            },
            Err(e) => {
                log::error!("Failed to load config file, using defaults: {}", e);
                Config::default()
            }
        }
    }

    fn read(&self) -> crate::Result<Config> {
        let data = fs::read(&self.path)
            .map_err(|e| SdmError::config(format!("cannot read {:?}: {}", self.path, e)))?;

        // An empty file is treated like a missing one
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }

        serde_json::from_slice(&data)
            .map_err(|e| SdmError::config(format!("malformed {:?}: {}", self.path, e)))
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_string_pretty(config).with_context(|| "Failed to serialize config")?;

        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write config file: {:?}", self.path))?;

        Ok(())
    }
}
