// src/heatmap/gradient.rs

use crate::math::{
    error::{HeatmapError, HeatmapResult},
    utils::interpolation::lerp,
};
use image::Rgba;
use serde::{Deserialize, Serialize};

pub type Color = Rgba<u8>;

pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);
pub const RED: Color = Rgba([255, 0, 0, 255]);
pub const YELLOW: Color = Rgba([255, 255, 0, 255]);
pub const GREEN: Color = Rgba([0, 255, 0, 255]);
pub const DARK_GREEN: Color = Rgba([0, 60, 0, 255]);
pub const YELLOW_TRANSPARENT: Color = Rgba([255, 255, 0, 0]);

/// Vordefinierte Farbverläufe. Schlechte Werte stehen links, gute rechts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradientColors {
    #[default]
    RedYellowGreen,
    GreenYellowRed,
    RedYellowGreenDarkGreen,
    RedGreen,
    RedYellowTransparent,
    /// Eigene Farbfolge als RGBA-Tupel
    Custom(Vec<[u8; 4]>),
}

impl GradientColors {
    pub fn colors(&self) -> Vec<Color> {
        match self {
            GradientColors::RedYellowGreen => vec![RED, YELLOW, GREEN],
            GradientColors::GreenYellowRed => vec![GREEN, YELLOW, RED],
            GradientColors::RedYellowGreenDarkGreen => vec![RED, YELLOW, GREEN, DARK_GREEN],
            GradientColors::RedGreen => vec![RED, GREEN],
            GradientColors::RedYellowTransparent => vec![RED, YELLOW, YELLOW_TRANSPARENT],
            GradientColors::Custom(colors) => colors.iter().map(|c| Rgba(*c)).collect(),
        }
    }

    pub fn validate(&self) -> HeatmapResult<()> {
        let count = self.colors().len();
        if count < 2 {
            return Err(HeatmapError::InvalidGradient {
                message: format!("a gradient needs at least 2 colors, got {}", count),
            });
        }
        Ok(())
    }
}

/// Breite des vorberechneten Farbstreifens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradientWidth {
    /// Eine Stufe pro Farbe
    #[default]
    Auto,
    Fixed(usize),
}

impl GradientWidth {
    pub fn resolve(&self, color_count: usize) -> usize {
        match self {
            GradientWidth::Auto => color_count,
            GradientWidth::Fixed(width) => *width,
        }
    }
}

/// Eindimensionaler, horizontal linearer Farbverlauf mit fester Pixelbreite.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStrip {
    pixels: Vec<Color>,
}

impl GradientStrip {
    /// Verteilt die Farben gleichmäßig von links nach rechts und tastet den
    /// Verlauf in der Mitte jedes Pixels ab.
    pub fn new(colors: &[Color], width: usize) -> HeatmapResult<Self> {
        if colors.len() < 2 {
            return Err(HeatmapError::InvalidGradient {
                message: format!("a gradient needs at least 2 colors, got {}", colors.len()),
            });
        }
        if width == 0 {
            return Err(HeatmapError::InvalidGradient {
                message: "gradient width must be greater than 0".to_string(),
            });
        }

        let segments = (colors.len() - 1) as f64;
        let pixels = (0..width)
            .map(|i| {
                let t = (i as f64 + 0.5) / width as f64;
                let scaled = t * segments;
                let index = (scaled.floor() as usize).min(colors.len() - 2);
                let local_t = scaled - index as f64;
                blend(colors[index], colors[index + 1], local_t)
            })
            .collect();

        Ok(Self { pixels })
    }

    pub fn width(&self) -> usize {
        self.pixels.len()
    }

    /// Farbe an `index`, begrenzt auf den gültigen Bereich.
    pub fn color_at(&self, index: usize) -> Color {
        self.pixels[index.min(self.pixels.len() - 1)]
    }
}

fn blend(from: Color, to: Color, t: f64) -> Color {
    let mut channels = [0u8; 4];
    for (i, channel) in channels.iter_mut().enumerate() {
        *channel = lerp(from.0[i] as f64, to.0[i] as f64, t).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(channels)
}
