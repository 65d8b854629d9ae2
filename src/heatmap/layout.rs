// src/heatmap/layout.rs

use crate::heatmap::sample::Sample;
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::{Bounds2D, Offset, Point2D},
    utils::scale::meters_to_pixels,
};
use tracing::debug;

/// Abbildung von Weltkoordinaten (Meter) auf Rasterpixel.
///
/// Natürliche Pixelkoordinaten entstehen durch `ceil(m * ppm)` je Achse; das
/// Offset verschiebt sie so, dass die linke obere Ecke des Messbereichs auf
/// `(0, 0)` liegt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub offset: Offset,
    pub size_x: usize,
    pub size_y: usize,
    pub pixels_per_meter: f64,
}

impl GridLayout {
    /// Passt das Raster an die Bounding Box aller Messorte und Flächenpunkte an.
    pub fn fit(sample_positions: &[Point2D], area_points: &[Point2D], pixels_per_meter: f64) -> HeatmapResult<Self> {
        let bounds = Bounds2D::from_points_iter(sample_positions.iter().chain(area_points.iter()))
            .ok_or(HeatmapError::EmptySampleSet)?;
        let zero = Point2D::new(
            meters_to_pixels(bounds.min.x, pixels_per_meter) as f64,
            meters_to_pixels(bounds.min.y, pixels_per_meter) as f64,
        );
        let size_x = meters_to_pixels(bounds.width().abs(), pixels_per_meter);
        let size_y = meters_to_pixels(bounds.height().abs(), pixels_per_meter);
        if size_x <= 0 || size_y <= 0 {
            return Err(HeatmapError::InvalidConfiguration {
                message: format!("measured area {} has no extent", bounds),
            });
        }
        debug!(
            "Grid layout: {}x{} pixels, zero at ({}, {}), bounds {}",
            size_x, size_y, zero.x, zero.y, bounds
        );
        Ok(Self {
            offset: -zero.coords,
            size_x: size_x as usize,
            size_y: size_y as usize,
            pixels_per_meter,
        })
    }

    /// Natürliche Pixelkoordinate eines Weltpunkts, ohne Offset.
    pub fn to_natural(&self, point: &Point2D) -> Point2D {
        Point2D::new(
            meters_to_pixels(point.x, self.pixels_per_meter) as f64,
            meters_to_pixels(point.y, self.pixels_per_meter) as f64,
        )
    }

    /// Rasterkoordinate eines Weltpunkts, z. B. der aktuellen Position.
    pub fn project(&self, point: &Point2D) -> Point2D {
        self.to_natural(point) + self.offset
    }

    /// Messungen mit Weltposition in natürliche Pixelkoordinaten.
    pub fn samples_to_natural(&self, samples: &[Sample]) -> Vec<Sample> {
        samples
            .iter()
            .map(|s| s.moved_to(self.to_natural(&s.position)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_covers_samples_and_area() {
        let samples = [Point2D::new(-1.0, 0.5), Point2D::new(2.0, 1.5)];
        let area = [
            Point2D::new(-1.5, 0.0),
            Point2D::new(2.5, 0.0),
            Point2D::new(2.5, 3.0),
        ];
        let layout = GridLayout::fit(&samples, &area, 100.0).unwrap();
        assert_eq!(layout.size_x, 400);
        assert_eq!(layout.size_y, 300);
        assert_eq!(layout.offset, Offset::new(150.0, 0.0));
        assert_eq!(layout.project(&Point2D::new(-1.5, 0.0)), Point2D::new(0.0, 0.0));
        assert_eq!(layout.project(&Point2D::new(2.0, 1.5)), Point2D::new(350.0, 150.0));
    }

    #[test]
    fn test_projection_rounds_up() {
        let layout = GridLayout::fit(&[Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)], &[], 10.0).unwrap();
        assert_eq!(layout.to_natural(&Point2D::new(0.01, -0.19)), Point2D::new(1.0, -1.0));
    }

    #[test]
    fn test_degenerate_layouts_fail() {
        assert!(matches!(
            GridLayout::fit(&[], &[], 100.0),
            Err(HeatmapError::EmptySampleSet)
        ));
        let single = [Point2D::new(1.0, 1.0)];
        assert!(matches!(
            GridLayout::fit(&single, &[], 100.0),
            Err(HeatmapError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_samples_move_to_natural_pixels() {
        let layout = GridLayout::fit(&[Point2D::new(0.0, 0.0), Point2D::new(2.0, 2.0)], &[], 50.0).unwrap();
        let samples = [Sample::new(0.5, 1.0, 0.25, 5180.0)];
        let natural = layout.samples_to_natural(&samples);
        assert_eq!(natural[0].position, Point2D::new(25.0, 50.0));
        assert_eq!(natural[0].power, 0.25);
        assert_eq!(natural[0].frequency, 5180.0);
    }
}
