use crate::core::gesture_detector::{DEFAULT_HAND_RAISE_MARGIN, DEFAULT_JUMP_THRESHOLD};
use crate::core::rate_meter::DEFAULT_RATE_WINDOW;
use crate::models::gesture::SwipeConfig;
use crate::models::stream::{FrameSourceTypes, StreamType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the settings file location
pub const CONFIG_PATH_ENV: &str = "KINECT_BRIDGE_CONFIG";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Streams opened at startup
    pub streams: Vec<StreamType>,
    /// Sub-frames requested when the composite stream is opened
    pub multi_source_types: Vec<StreamType>,
    /// Capacity of the event bus before slow subscribers start lagging
    pub event_capacity: usize,
    /// Frame-rate metering window in milliseconds
    pub rate_window_ms: u64,
    /// Swipe classification thresholds
    pub swipe: SwipeConfig,
    /// How far above the head a raised hand may read (meters)
    pub hand_raise_margin_m: f32,
    /// Average foot height that counts as a jump (meters)
    pub jump_threshold_m: f32,
    /// Recorded session fed to the replay sensor; simulation when unset
    pub replay_path: Option<PathBuf>,
    /// Restart the recording when it ends
    pub replay_loop: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            streams: vec![StreamType::Body],
            multi_source_types: vec![StreamType::Color, StreamType::Depth, StreamType::Body],
            event_capacity: 64,
            rate_window_ms: DEFAULT_RATE_WINDOW.as_millis() as u64,
            swipe: SwipeConfig::default(),
            hand_raise_margin_m: DEFAULT_HAND_RAISE_MARGIN,
            jump_threshold_m: DEFAULT_JUMP_THRESHOLD,
            replay_path: None,
            replay_loop: true,
        }
    }
}

impl Config {
    /// Load configuration from file, creating with defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            log::info!("Wrote default configuration to {}", path.display());
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.swipe.validate()?;

        // Holds for the stock values too
        if self.swipe.cooldown_period_ms >= self.swipe.tracking_duration_ms {
            log::debug!(
                "Swipe cooldown ({}ms) is not shorter than the tracking window ({}ms)",
                self.swipe.cooldown_period_ms,
                self.swipe.tracking_duration_ms
            );
        }

        for stream in &self.multi_source_types {
            if stream.source_bit().is_none() {
                let allowed: Vec<&str> = StreamType::ALL
                    .iter()
                    .filter(|s| s.source_bit().is_some())
                    .map(|s| s.as_str())
                    .collect();
                return Err(format!(
                    "Invalid multi-source type: {}. Must be one of: {}",
                    stream,
                    allowed.join(", ")
                )
                .into());
            }
        }

        if self.event_capacity == 0 || self.event_capacity > 4096 {
            return Err(format!(
                "Invalid event capacity: {}. Must be between 1 and 4096",
                self.event_capacity
            )
            .into());
        }

        if !(100..=10_000).contains(&self.rate_window_ms) {
            return Err(format!(
                "Invalid rate window: {}ms. Must be between 100 and 10000",
                self.rate_window_ms
            )
            .into());
        }

        for (name, value) in [
            ("hand raise margin", self.hand_raise_margin_m),
            ("jump threshold", self.jump_threshold_m),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("Invalid {}: {}. Must be non-negative", name, value).into());
            }
        }

        Ok(())
    }

    /// Bitmask form of `multi_source_types`
    pub fn multi_source_mask(&self) -> FrameSourceTypes {
        FrameSourceTypes::from_streams(&self.multi_source_types)
    }

    /// Reset to default configuration
    pub fn reset() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".kinect_bridge");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}
