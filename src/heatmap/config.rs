// src/heatmap/config.rs

use crate::heatmap::{
    boundary::ExternalPointStrategy,
    color::ColorMode,
    engine::{EngineSettings, default_thread_count},
    gradient::{GradientColors, GradientWidth},
};
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    utils::constants::{DEFAULT_PIXELS_PER_METER, FUZZY_WIDTH, MAX_PIXELS_PER_TASK, MAX_POWER, MIN_POWER},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Konfiguration eines Generierungslaufs.
///
/// Alle Felder haben Standardwerte, eine JSON-Datei muss nur die Abweichungen enthalten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Wert der vier künstlichen Eckpunkte
    pub external_point_strategy: ExternalPointStrategy,
    /// Größe des Worker-Pools
    pub thread_count: usize,
    /// Rechtecke mit mehr Pixeln werden in Quadranten zerlegt
    pub max_pixels_per_task: usize,
    pub color_mode: ColorMode,
    pub gradient_colors: GradientColors,
    pub gradient_width: GradientWidth,
    /// Toleranz der unscharfen Dreiecksprüfung in Pixeln
    pub fuzzy_width: f64,
    /// Leistung (Watt) für `AssumeLow`
    pub min_power: f64,
    /// Leistung (Watt) für `AssumeHigh`
    pub max_power: f64,
    pub pixels_per_meter: f64,
    /// Ohne Wert wird unbegrenzt auf die Worker gewartet.
    pub completion_timeout_ms: Option<u64>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            external_point_strategy: ExternalPointStrategy::default(),
            thread_count: default_thread_count(),
            max_pixels_per_task: MAX_PIXELS_PER_TASK,
            color_mode: ColorMode::default(),
            gradient_colors: GradientColors::default(),
            gradient_width: GradientWidth::default(),
            fuzzy_width: FUZZY_WIDTH,
            min_power: MIN_POWER,
            max_power: MAX_POWER,
            pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            completion_timeout_ms: None,
        }
    }
}

impl HeatmapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> HeatmapResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> HeatmapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn with_external_point_strategy(mut self, strategy: ExternalPointStrategy) -> Self {
        self.external_point_strategy = strategy;
        self
    }

    pub fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    pub fn with_max_pixels_per_task(mut self, count: usize) -> Self {
        self.max_pixels_per_task = count;
        self
    }

    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    pub fn with_gradient_colors(mut self, colors: GradientColors) -> Self {
        self.gradient_colors = colors;
        self
    }

    pub fn with_gradient_width(mut self, width: GradientWidth) -> Self {
        self.gradient_width = width;
        self
    }

    pub fn with_fuzzy_width(mut self, width: f64) -> Self {
        self.fuzzy_width = width;
        self
    }

    pub fn with_power_range(mut self, min_power: f64, max_power: f64) -> Self {
        self.min_power = min_power;
        self.max_power = max_power;
        self
    }

    pub fn with_pixels_per_meter(mut self, pixels_per_meter: f64) -> Self {
        self.pixels_per_meter = pixels_per_meter;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            thread_count: self.thread_count,
            max_pixels_per_task: self.max_pixels_per_task,
            completion_timeout: self.completion_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn validate(&self) -> HeatmapResult<()> {
        if self.thread_count == 0 {
            return Err(invalid("thread_count must be at least 1"));
        }
        if self.max_pixels_per_task == 0 {
            return Err(invalid("max_pixels_per_task must be at least 1"));
        }
        if !self.fuzzy_width.is_finite() || self.fuzzy_width < 0.0 {
            return Err(invalid("fuzzy_width must be a finite, non-negative number"));
        }
        if !(self.min_power.is_finite() && self.max_power.is_finite()) {
            return Err(invalid("min_power and max_power must be finite"));
        }
        if self.min_power < 0.0 {
            return Err(invalid("min_power must not be negative (linear watts)"));
        }
        if self.min_power > self.max_power {
            return Err(invalid("min_power must not exceed max_power"));
        }
        if !self.pixels_per_meter.is_finite() || self.pixels_per_meter <= 0.0 {
            return Err(invalid("pixels_per_meter must be positive"));
        }
        if self.gradient_width == GradientWidth::Fixed(0) {
            return Err(HeatmapError::InvalidGradient {
                message: "gradient width must be greater than 0".to_string(),
            });
        }
        self.gradient_colors.validate()
    }
}

fn invalid(message: &str) -> HeatmapError {
    HeatmapError::InvalidConfiguration {
        message: message.to_string(),
    }
}
