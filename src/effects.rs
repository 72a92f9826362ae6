//! The cosmetic values the detector pushes onto a video element.
//!
//! Each type renders to the CSS the page understands, so a browser host can
//! forward them verbatim and a native host can read the fields instead.

use crate::config::{DetectorConfig, PulseEffect};
use crate::core_modules::pixel::Color;

/// Marks an element as pulsing for the duration of one pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseMarker {
    pub effect: PulseEffect,
    pub duration_ms: u64,
    pub scale: f64,
}

impl PulseMarker {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            effect: config.pulse_effect,
            duration_ms: config.pulsate_duration_ms,
            scale: config.pulsate_scale,
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.effect.class_name()
    }

    /// Custom properties the pulse animations read.
    pub fn css_properties(&self) -> Vec<(&'static str, String)> {
        let mut props = vec![
            ("--pulse-duration", format!("{}ms", self.duration_ms)),
            ("--pulse-scale", format!("{}", self.scale)),
        ];
        if self.effect == PulseEffect::Bpm {
            props.push(("--pulse-bpm-scale", format!("{}", self.scale)));
        }
        props
    }
}

/// An ambient glow tinted by the latest sample's mean color.
#[derive(Debug, Clone, PartialEq)]
pub struct GlowStyle {
    pub color: Color,
    pub size_px: u32,
    pub opacity: f64,
    /// Fade between two glows; one sampling interval long.
    pub transition_ms: u64,
}

impl GlowStyle {
    pub fn new(color: Color, config: &DetectorConfig) -> Self {
        Self {
            color,
            size_px: config.glow.size_px,
            opacity: config.glow.opacity,
            transition_ms: config.sample_interval_ms,
        }
    }

    pub fn transition(&self) -> String {
        format!("box-shadow {}ms ease-in-out", self.transition_ms)
    }

    pub fn box_shadow(&self) -> String {
        format!(
            "0 0 {}px rgba({}, {}, {}, {})",
            self.size_px, self.color[0], self.color[1], self.color[2], self.opacity
        )
    }
}

/// The saturate/contrast filter kept on the player between samples.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFilter {
    pub saturation: f64,
    pub contrast: f64,
}

impl VideoFilter {
    /// `None` when the filter is switched off.
    pub fn from_config(config: &DetectorConfig) -> Option<Self> {
        config.enable_saturation.then(|| Self {
            saturation: config.saturation_boost,
            contrast: config.contrast_boost,
        })
    }

    /// CSS `filter` value. Neutral factors are left out; nothing left is `none`.
    pub fn filter_string(&self) -> String {
        let mut parts = Vec::new();
        if self.saturation != 1.0 {
            parts.push(format!("saturate({})", self.saturation));
        }
        if self.contrast != 1.0 {
            parts.push(format!("contrast({})", self.contrast));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }
}
