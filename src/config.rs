// THEORY:
// Configuration is consumed, never owned. The host keeps the user's preferences
// wherever it likes and hands the detector a plain settings object. Every field
// carries a serde default so a partially saved blob merges over the defaults,
// and `validate` rejects values outside the ranges the settings UI offers
// instead of quietly clamping them.

use crate::error::{PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Tuning for scene-change detection and the pulse it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Milliseconds between two sampling ticks.
    pub sample_interval_ms: u64,
    /// Side of the NxN sampling grid.
    pub grid_size: u32,
    /// Per-cell RGB distance (0-255 scale) above which a cell counts as moving.
    pub motion_threshold: f64,
    /// Combined score (0-1) at or above which a scene change is declared.
    pub scene_change_confidence: f64,
    /// Minimum time between the starts of two pulses.
    pub cooldown_period_ms: u64,
    /// How long a pulse stays applied.
    pub pulsate_duration_ms: u64,
    pub enable_pulsing: bool,
    /// Multiplier applied to the mean color after saturation.
    pub color_boost: f64,
    /// Saturation multiplier for the mean color. 1.0 leaves it untouched.
    pub glow_saturation: f64,
    /// Whether the player itself gets the saturate/contrast filter.
    pub enable_saturation: bool,
    /// CSS `saturate()` factor for the player. 1.0 leaves it out.
    pub saturation_boost: f64,
    /// CSS `contrast()` factor for the player. 1.0 leaves it out.
    pub contrast_boost: f64,
    pub pulse_effect: PulseEffect,
    /// How much the video grows during a scale pulse.
    pub pulsate_scale: f64,
    pub glow: GlowConfig,
}

/// The ambient glow painted from each sample's mean color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    pub enabled: bool,
    /// Blur radius in CSS pixels.
    pub size_px: u32,
    pub opacity: f64,
}

/// Which pulse animation the marker selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseEffect {
    Scale,
    Glow,
    Fade,
    Both,
    Bpm,
}

impl PulseEffect {
    /// The marker class applied to the element while this effect runs.
    pub fn class_name(self) -> &'static str {
        match self {
            PulseEffect::Scale => "video-pulse-scale",
            PulseEffect::Glow => "video-pulse-glow",
            PulseEffect::Fade => "video-pulse-fade",
            PulseEffect::Both => "video-pulse-both",
            PulseEffect::Bpm => "video-pulse-bpm",
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            grid_size: 16,
            motion_threshold: 60.0,
            scene_change_confidence: 0.45,
            cooldown_period_ms: 300,
            pulsate_duration_ms: 200,
            enable_pulsing: true,
            color_boost: 1.2,
            glow_saturation: 1.0,
            enable_saturation: true,
            saturation_boost: 2.0,
            contrast_boost: 1.1,
            pulse_effect: PulseEffect::Scale,
            pulsate_scale: 1.05,
            glow: GlowConfig::default(),
        }
    }
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_px: 200,
            opacity: 0.85,
        }
    }
}

fn check<T>(name: &str, value: T, range: RangeInclusive<T>) -> PulseResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(PulseError::config(format!(
            "{name} = {value} is outside {}..={}",
            range.start(),
            range.end()
        )))
    }
}

impl DetectorConfig {
    /// Rejects any field outside the range the settings UI allows.
    pub fn validate(&self) -> PulseResult<()> {
        check("grid_size", self.grid_size, 1..=256)?;
        check("sample_interval_ms", self.sample_interval_ms, 1..=u64::MAX)?;
        check("motion_threshold", self.motion_threshold, 20.0..=100.0)?;
        check(
            "scene_change_confidence",
            self.scene_change_confidence,
            0.1..=0.9,
        )?;
        check("pulsate_duration_ms", self.pulsate_duration_ms, 100..=500)?;
        check("cooldown_period_ms", self.cooldown_period_ms, 100..=1000)?;
        check("color_boost", self.color_boost, 1.0..=2.0)?;
        check("glow_saturation", self.glow_saturation, 0.0..=5.0)?;
        check("saturation_boost", self.saturation_boost, 1.0..=4.0)?;
        check("contrast_boost", self.contrast_boost, 0.8..=1.5)?;
        check("pulsate_scale", self.pulsate_scale, 1.01..=1.2)?;
        check("glow.size_px", self.glow.size_px, 50..=400)?;
        check("glow.opacity", self.glow.opacity, 0.1..=1.0)?;
        Ok(())
    }

    /// Parses a saved settings blob, filling gaps with defaults, and validates it.
    pub fn from_json(json: &str) -> PulseResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the settings for whatever persists them.
    pub fn to_json(&self) -> PulseResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "scene_pulse=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Everything the example runner reads from its config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate a runner config file.
    pub fn load(path: &std::path::Path) -> PulseResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.detector.validate()?;
        Ok(config)
    }
}
