// src/heatmap/color.rs

use crate::heatmap::{
    gradient::{Color, GradientColors, GradientStrip, GradientWidth},
    grid::ScalarGrid,
    polygon::AreaPolygon,
};
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::Point2D,
    utils::power::{signal_level, watts_to_dbm},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Art, wie ein Skalarwert auf den Farbverlauf abgebildet wird.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Position im Verlauf relativ zu den Min/Max-Werten des Rasters
    #[default]
    Bounds,
    /// Quantisierung auf Signalbalken, eine Farbe pro Balken
    WifiBars,
}

impl ColorMode {
    /// Unbekannte Namen fallen auf `Bounds` zurück.
    pub fn from_name(name: &str) -> Self {
        match name {
            "WIFI_BARS" => ColorMode::WifiBars,
            _ => ColorMode::Bounds,
        }
    }
}

/// Wertebereich der sichtbaren Pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone)]
pub struct ColorSelector {
    mode: ColorMode,
    gradient: GradientStrip,
    bounds: Option<ValueBounds>,
}

impl ColorSelector {
    /// `bounds` wird nur im Modus `Bounds` benötigt und sonst ignoriert.
    /// Im Modus `WifiBars` entspricht die Verlaufsbreite immer der Farbanzahl.
    pub fn new(
        mode: ColorMode,
        colors: &GradientColors,
        width: GradientWidth,
        bounds: Option<ValueBounds>,
    ) -> HeatmapResult<Self> {
        let palette = colors.colors();
        let (gradient_width, bounds) = match mode {
            ColorMode::Bounds => {
                let bounds = bounds.ok_or_else(|| HeatmapError::InvalidConfiguration {
                    message: "color mode 'bounds' requires value bounds".to_string(),
                })?;
                (width.resolve(palette.len()), Some(bounds))
            }
            ColorMode::WifiBars => (palette.len(), None),
        };
        let gradient = GradientStrip::new(&palette, gradient_width)?;
        debug!(
            "ColorSelector created: mode {:?}, gradient width {}, bounds {:?}",
            mode, gradient_width, bounds
        );
        Ok(Self {
            mode,
            gradient,
            bounds,
        })
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn gradient_width(&self) -> usize {
        self.gradient.width()
    }

    /// Index im Farbverlauf für `value`.
    ///
    /// Im Modus `Bounds` gilt `value / (min + max) * width`. Das ist keine
    /// Min-Max-Normierung; bei gemischten Vorzeichen oder `min + max` nahe 0
    /// landet der Index am Rand. Nicht-endliche Werte ergeben Index 0, im
    /// Modus `WifiBars` auch Leistungen ohne gültigen dBm-Wert.
    pub fn gradient_index(&self, value: f64) -> usize {
        let width = self.gradient.width();
        match (self.mode, self.bounds) {
            (ColorMode::Bounds, Some(bounds)) => {
                let fraction = value / (bounds.min + bounds.max);
                // `as usize` sättigt: NaN und negative Werte -> 0
                ((fraction * width as f64) as usize).min(width - 1)
            }
            _ => {
                // Negative oder NaN-Leistung hat kein dBm-Äquivalent
                let dbm = watts_to_dbm(value);
                if !dbm.is_finite() {
                    return 0;
                }
                signal_level(dbm.round() as i32, width)
            }
        }
    }

    pub fn color_for_value(&self, value: f64) -> Color {
        self.gradient.color_at(self.gradient_index(value))
    }
}

/// Sucht Minimum und Maximum aller Zellen innerhalb von `area`, die nicht `NaN` sind.
pub fn find_min_and_max_values(area: &AreaPolygon, grid: &ScalarGrid) -> HeatmapResult<ValueBounds> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (x, y, value) in grid.iter() {
        if !value.is_nan() && area.is_point_in_polygon(&Point2D::new(x as f64, y as f64)) {
            min = min.min(value);
            max = max.max(value);
        }
    }
    if min <= max {
        Ok(ValueBounds { min, max })
    } else {
        Err(HeatmapError::NoValidValues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::utils::power::dbm_to_watts;

    #[test]
    fn test_find_min_max_heatmap_values() {
        let grid = ScalarGrid::from_columns(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        // Bereich ohne P(0|0)
        let area = AreaPolygon::new(vec![
            Point2D::new(-0.1, 1.1),
            Point2D::new(1.1, -0.1),
            Point2D::new(1.1, 1.1),
        ]);
        let bounds = find_min_and_max_values(&area, &grid).unwrap();
        assert_eq!(bounds.min, 2.0);
        assert_eq!(bounds.max, 4.0);
    }

    #[test]
    fn test_find_min_max_skips_nan_and_fails_without_data() {
        let grid = ScalarGrid::from_columns(vec![vec![f64::NAN, 5.0], vec![f64::NAN, f64::NAN]]).unwrap();
        let area = AreaPolygon::full_grid(2, 2);
        let bounds = find_min_and_max_values(&area, &grid).unwrap();
        assert_eq!((bounds.min, bounds.max), (5.0, 5.0));

        let empty = AreaPolygon::default();
        assert!(matches!(
            find_min_and_max_values(&empty, &grid),
            Err(HeatmapError::NoValidValues)
        ));
    }

    #[test]
    fn test_get_mode() {
        assert_eq!(ColorMode::from_name("BOUNDS"), ColorMode::Bounds);
        assert_eq!(ColorMode::from_name("WIFI_BARS"), ColorMode::WifiBars);
        assert_eq!(ColorMode::from_name("something"), ColorMode::Bounds);
    }

    #[test]
    fn test_bounds_mode_preserves_sum_formula() {
        let selector = ColorSelector::new(
            ColorMode::Bounds,
            &GradientColors::RedGreen,
            GradientWidth::Fixed(100),
            Some(ValueBounds { min: 1.0, max: 3.0 }),
        )
        .unwrap();
        // 2 / (1 + 3) * 100 = 50, nicht (2 - 1) / (3 - 1) * 100
        assert_eq!(selector.gradient_index(2.0), 50);
        assert_eq!(selector.gradient_index(3.0), 75);
        assert_eq!(selector.gradient_index(100.0), 99);
        assert_eq!(selector.gradient_index(-5.0), 0);
        assert_eq!(selector.gradient_index(f64::NAN), 0);
    }

    #[test]
    fn test_bounds_mode_with_zero_sum_does_not_panic() {
        let selector = ColorSelector::new(
            ColorMode::Bounds,
            &GradientColors::RedGreen,
            GradientWidth::Fixed(10),
            Some(ValueBounds { min: -1.0, max: 1.0 }),
        )
        .unwrap();
        assert_eq!(selector.gradient_index(0.5), 9);
        assert_eq!(selector.gradient_index(-0.5), 0);
    }

    #[test]
    fn test_bounds_mode_requires_bounds() {
        let result = ColorSelector::new(
            ColorMode::Bounds,
            &GradientColors::RedGreen,
            GradientWidth::Auto,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_wifi_bars_mode() {
        let selector = ColorSelector::new(
            ColorMode::WifiBars,
            &GradientColors::RedYellowGreen,
            GradientWidth::Fixed(500),
            None,
        )
        .unwrap();
        assert_eq!(selector.gradient_width(), 3);
        assert_eq!(selector.gradient_index(dbm_to_watts(-40.0)), 2);
        assert_eq!(selector.gradient_index(dbm_to_watts(-80.0)), 0);
        // (-70 + 100) * 2 / 45 = 1.33
        assert_eq!(selector.gradient_index(dbm_to_watts(-70.0)), 1);
        assert_eq!(selector.gradient_index(0.0), 0);
        assert_eq!(selector.color_for_value(dbm_to_watts(-40.0)), selector.color_for_value(1.0));
    }

    #[test]
    fn test_wifi_bars_invalid_power_gets_lowest_bar() {
        let selector = ColorSelector::new(
            ColorMode::WifiBars,
            &GradientColors::RedYellowGreen,
            GradientWidth::Auto,
            None,
        )
        .unwrap();
        assert_eq!(selector.gradient_index(-1e-6), 0);
        assert_eq!(selector.gradient_index(f64::NAN), 0);
        assert_eq!(selector.gradient_index(1e-4), 2);
    }
}
