//! Host configuration: pacing, counter service and session start.

use derive_getters::Getters;
use derive_more::{Display, Error};
use ladder_engine::Level;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Environment variable that overrides [`LadderConfig::records_url`].
pub const RECORDS_URL_ENV: &str = "LADDER_RECORDS_URL";

/// Configuration for a ladder session.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Base URL of the shared counter service. `None` plays offline.
    #[serde(default)]
    records_url: Option<String>,

    /// Opponent thinking time on flat levels, in milliseconds.
    #[serde(default = "default_ai_delay_ms")]
    ai_delay_ms: u64,

    /// Opponent thinking time on the composite level, in milliseconds.
    #[serde(default = "default_super_ai_delay_ms")]
    super_ai_delay_ms: u64,

    /// Pause after a board rotation, in milliseconds.
    #[serde(default = "default_rotation_settle_ms")]
    rotation_settle_ms: u64,

    /// Pause before the next level is shown, in milliseconds.
    #[serde(default = "default_advance_pause_ms")]
    advance_pause_ms: u64,

    /// Seed for the opponent and infection rolls. Random when unset.
    #[serde(default)]
    seed: Option<u64>,

    /// Level number (1-7) the session starts on.
    #[serde(default = "default_start_level")]
    start_level: u8,
}

fn default_ai_delay_ms() -> u64 {
    700
}

fn default_super_ai_delay_ms() -> u64 {
    800
}

fn default_rotation_settle_ms() -> u64 {
    500
}

fn default_advance_pause_ms() -> u64 {
    1000
}

fn default_start_level() -> u8 {
    Level::FIRST.number()
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            records_url: None,
            ai_delay_ms: default_ai_delay_ms(),
            super_ai_delay_ms: default_super_ai_delay_ms(),
            rotation_settle_ms: default_rotation_settle_ms(),
            advance_pause_ms: default_advance_pause_ms(),
            seed: None,
            start_level: default_start_level(),
        }
    }
}

impl LadderConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.level()?;

        info!(start_level = config.start_level, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise the defaults, then applies the
    /// environment override.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            debug!("No config file, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Replaces the records URL with [`RECORDS_URL_ENV`] when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(RECORDS_URL_ENV)
            && !url.trim().is_empty()
        {
            debug!(url = %url, "Records URL taken from environment");
            self.records_url = Some(url);
        }
        self
    }

    /// Starts on `level` instead.
    pub fn with_start_level(mut self, level: u8) -> Self {
        self.start_level = level;
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Drops the counter service.
    pub fn offline(mut self) -> Self {
        if self.records_url.take().is_some() {
            warn!("Counter service disabled, records stay in memory");
        }
        self
    }

    /// The starting level.
    ///
    /// # Errors
    ///
    /// Fails when `start_level` is not 1 through 7.
    #[track_caller]
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_number(self.start_level).ok_or_else(|| {
            ConfigError::new(format!(
                "start_level must be 1-{}, got {}",
                Level::ALL.len(),
                self.start_level
            ))
        })
    }

    /// Host delays derived from the millisecond settings.
    pub fn pacing(&self) -> Pacing {
        Pacing {
            thinking: Duration::from_millis(self.ai_delay_ms),
            deep_thinking: Duration::from_millis(self.super_ai_delay_ms),
            rotation_settle: Duration::from_millis(self.rotation_settle_ms),
            advance_pause: Duration::from_millis(self.advance_pause_ms),
        }
    }
}

/// Delays the host inserts between engine steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Before an opponent move on flat levels.
    pub thinking: Duration,
    /// Before an opponent move on the composite level.
    pub deep_thinking: Duration,
    /// After a rotation, before play continues.
    pub rotation_settle: Duration,
    /// After a level is cleared, before the next board is shown.
    pub advance_pause: Duration,
}

impl Pacing {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            thinking: Duration::ZERO,
            deep_thinking: Duration::ZERO,
            rotation_settle: Duration::ZERO,
            advance_pause: Duration::ZERO,
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
