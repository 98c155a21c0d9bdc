//! Application settings
//!
//! Settings live in `settings.yaml` inside the data directory. A missing file
//! means defaults; out-of-range values are clamped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::DayPolicy;
use crate::timer::{RecoveryOptions, RecoveryPolicy};

/// Settings file name
const CONFIG_FILENAME: &str = "settings.yaml";

/// Application directory name under the platform data dir
const APP_DIR_NAME: &str = "pulse";

/// Default database file name
pub const DEFAULT_DATABASE_FILE: &str = "pulse.db";

/// Default tick period
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write daily-rolling log files here instead of stderr
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

/// Pulse settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Database file, relative to the data directory
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Startup handling of an open session
    #[serde(default)]
    pub recovery: RecoveryPolicy,

    /// Cap on a session closed by recovery, in hours
    #[serde(default = "default_max_session_hours")]
    pub max_session_hours: u32,

    /// Fixed day-boundary offset east of UTC; device-local when absent
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    /// Days of history for the heat-map
    #[serde(default = "default_stats_days")]
    pub stats_days: u32,

    #[serde(default)]
    pub log: LogSettings,
}

fn default_database_file() -> String {
    DEFAULT_DATABASE_FILE.to_string()
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_max_session_hours() -> u32 {
    12
}

fn default_stats_days() -> u32 {
    90
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            tick_interval_ms: default_tick_interval_ms(),
            recovery: RecoveryPolicy::default(),
            max_session_hours: default_max_session_hours(),
            utc_offset_minutes: None,
            stats_days: default_stats_days(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Platform data directory for Pulse
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}")))
    }

    /// Load settings from the data directory
    ///
    /// # Arguments
    /// * `data_dir` - Directory holding `settings.yaml`
    ///
    /// # Returns
    /// Normalized settings, defaults if the file is missing. An unreadable
    /// or malformed file is an error so the caller can report it once
    /// logging is up.
    pub fn load(data_dir: &Path) -> Result<Self, AppError> {
        let config_path = data_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let settings: Self = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("malformed {}: {e}", config_path.display()))
        })?;

        Ok(settings.normalized())
    }

    /// Save settings to the data directory
    pub fn save(&self, data_dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(data_dir)?;

        let content = serde_yaml::to_string(self)
            .map_err(|e| AppError::Config(format!("failed to serialize settings: {e}")))?;

        fs::write(data_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    /// Clamp values into their supported ranges
    pub fn normalized(mut self) -> Self {
        self.tick_interval_ms = self.tick_interval_ms.clamp(100, 60_000);
        self.max_session_hours = self.max_session_hours.clamp(1, 72);
        self.stats_days = self.stats_days.clamp(7, 3660);
        self.utc_offset_minutes = self
            .utc_offset_minutes
            .map(|minutes| minutes.clamp(-14 * 60, 14 * 60));
        if self.database_file.trim().is_empty() {
            self.database_file = default_database_file();
        }
        self
    }

    /// Full path of the database file
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    pub fn recovery_options(&self) -> RecoveryOptions {
        RecoveryOptions {
            policy: self.recovery,
            max_session: Duration::hours(i64::from(self.max_session_hours)),
        }
    }

    /// Configured fixed day policy; `None` means device-local at read time
    pub fn day_policy(&self) -> Option<DayPolicy> {
        self.utc_offset_minutes
            .and_then(DayPolicy::from_offset_minutes)
    }
}
