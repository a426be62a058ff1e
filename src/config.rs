//! Configuration management for pageloader
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.pageloader/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::errors::{LoaderError, Result};

/// Complete configuration for pageloader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loader: LoaderConfig,
    pub easing: EasingConfig,
    pub handoff: HandoffConfig,
    pub slider: SliderConfig,
    pub form: FormConfig,
    pub scroll: ScrollConfig,
    pub telemetry: TelemetryConfig,
}

/// Timing and estimator weights for the loading sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Minimum time the splash stays up; also the safety timeout
    pub min_duration_ms: u64,
    /// Pause between reaching 100% and starting the hand-off
    pub exit_delay_ms: u64,
    /// Render loop period (~60 fps)
    pub frame_interval_ms: u64,
    /// Highest value the time estimator may report on its own
    pub time_cap: f64,
    /// Where the resource estimator starts once anything settles
    pub resource_floor: f64,
    /// Range the resource estimator spreads settled/total over
    pub resource_span: f64,
}

/// Eased-step constants for the render loop and the completion ramp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EasingConfig {
    pub rate: f64,
    pub min_step: f64,
    pub completion_rate: f64,
    pub completion_min_step: f64,
}

/// Hand-off animation phases and content entrance staggering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Delay after hiding the indicator before content is revealed
    pub reveal_delay_ms: u64,
    /// Delay after hiding the indicator before it is retired and completion fires
    pub retire_delay_ms: u64,
    pub entrance_stagger_ms: u64,
    pub entrance_duration_ms: u64,
    pub entrance_offset_px: u32,
    /// Elements animated in once the page is revealed
    pub entrance_targets: Vec<String>,
}

/// Hero slider behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    pub interval_ms: u64,
    pub swipe_threshold_px: f64,
}

/// Simulated contact form timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub send_delay_ms: u64,
    pub reset_after_ms: u64,
}

/// Scroll-driven effects: section reveals and the header's scrolled state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Visible fraction of an element needed to reveal it
    pub reveal_threshold: f64,
    /// Vertical offset revealed elements slide up from
    pub reveal_offset_px: u32,
    /// Delay between elements revealed by the same observation
    pub reveal_stagger_ms: u64,
    pub reveal_duration_ms: u64,
    /// Scroll position past which the header is marked scrolled
    pub header_scrolled_px: f64,
}

/// Terminal display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub default_verbosity: String,
    pub show_progress_bars: bool,
    pub color_output: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 3000,
            exit_delay_ms: 400,
            frame_interval_ms: 16,
            time_cap: 90.0,
            resource_floor: 60.0,
            resource_span: 30.0,
        }
    }
}

impl Default for EasingConfig {
    fn default() -> Self {
        Self {
            rate: 0.08,
            min_step: 0.3,
            completion_rate: 0.15,
            completion_min_step: 0.8,
        }
    }
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 500,
            retire_delay_ms: 1300,
            entrance_stagger_ms: 60,
            entrance_duration_ms: 600,
            entrance_offset_px: 20,
            entrance_targets: [
                ".hero__badge",
                ".hero__title",
                ".hero__text",
                ".hero__cta",
                ".nav__brand",
                ".nav__links li",
                ".nav__cta",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            interval_ms: 6000,
            swipe_threshold_px: 50.0,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            send_delay_ms: 1500,
            reset_after_ms: 3000,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            reveal_threshold: 0.1,
            reveal_offset_px: 20,
            reveal_stagger_ms: 50,
            reveal_duration_ms: 500,
            header_scrolled_px: 100.0,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            show_progress_bars: true,
            color_output: true,
        }
    }
}

impl LoaderConfig {
    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LoaderError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config location, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".pageloader").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let loader = &self.loader;
        if loader.min_duration_ms == 0 {
            return Err(LoaderError::ConfigError(
                "min_duration_ms must be greater than 0".to_string(),
            ));
        }

        if loader.frame_interval_ms == 0 {
            return Err(LoaderError::ConfigError(
                "frame_interval_ms must be greater than 0".to_string(),
            ));
        }

        if !(loader.time_cap > 0.0 && loader.time_cap < 100.0) {
            return Err(LoaderError::ConfigError(
                "time_cap must be between 0 and 100 (exclusive)".to_string(),
            ));
        }

        if loader.resource_floor < 0.0
            || loader.resource_span < 0.0
            || loader.resource_floor + loader.resource_span > 100.0
        {
            return Err(LoaderError::ConfigError(
                "resource_floor + resource_span must stay within 0..=100".to_string(),
            ));
        }

        for (name, rate) in [
            ("rate", self.easing.rate),
            ("completion_rate", self.easing.completion_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(LoaderError::ConfigError(format!(
                    "{} must be in (0, 1]",
                    name
                )));
            }
        }

        if self.easing.min_step <= 0.0 || self.easing.completion_min_step <= 0.0 {
            return Err(LoaderError::ConfigError(
                "easing min steps must be greater than 0".to_string(),
            ));
        }

        if self.handoff.retire_delay_ms < self.handoff.reveal_delay_ms {
            return Err(LoaderError::ConfigError(
                "retire_delay_ms must not be shorter than reveal_delay_ms".to_string(),
            ));
        }

        if self.slider.interval_ms == 0 {
            return Err(LoaderError::ConfigError(
                "slider interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.slider.swipe_threshold_px < 0.0 {
            return Err(LoaderError::ConfigError(
                "swipe_threshold_px must not be negative".to_string(),
            ));
        }

        if !(self.scroll.reveal_threshold >= 0.0 && self.scroll.reveal_threshold <= 1.0) {
            return Err(LoaderError::ConfigError(
                "reveal_threshold must be in 0..=1".to_string(),
            ));
        }

        if self.scroll.header_scrolled_px < 0.0 {
            return Err(LoaderError::ConfigError(
                "header_scrolled_px must not be negative".to_string(),
            ));
        }

        match self.telemetry.default_verbosity.as_str() {
            "quiet" | "normal" | "verbose" | "very_verbose" => {}
            other => {
                return Err(LoaderError::ConfigError(format!(
                    "unknown verbosity '{}'",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Render configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
