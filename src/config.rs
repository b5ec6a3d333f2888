//! Drill configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Longest hold allowed between scoring a stage and moving on.
pub const MAX_DISPLAY_DELAY_MS: u64 = 2_000;

/// Drill settings.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct DrillConfig {
    /// Hold time for a stage result before the next stage, in milliseconds.
    #[serde(default = "default_display_delay_ms")]
    result_display_delay_ms: u64,

    /// Stage catalog to play instead of the built-in stages.
    #[serde(default)]
    stages_file: Option<PathBuf>,
}

fn default_display_delay_ms() -> u64 {
    1_500
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            result_display_delay_ms: default_display_delay_ms(),
            stages_file: None,
        }
    }
}

impl DrillConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(
            delay_ms = config.result_display_delay_ms,
            stages_file = ?config.stages_file,
            "Config loaded successfully"
        );
        Ok(config.clamped())
    }

    /// Overrides the display delay.
    pub fn with_display_delay_ms(mut self, ms: u64) -> Self {
        self.result_display_delay_ms = ms;
        self.clamped()
    }

    /// Overrides the stage catalog path.
    pub fn with_stages_file(mut self, path: PathBuf) -> Self {
        self.stages_file = Some(path);
        self
    }

    /// The display delay as a duration.
    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.result_display_delay_ms)
    }

    fn clamped(mut self) -> Self {
        self.result_display_delay_ms = self.result_display_delay_ms.min(MAX_DISPLAY_DELAY_MS);
        self
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
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
