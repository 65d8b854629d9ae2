// src/heatmap/polygon.rs

use crate::math::types::{Offset, Point2D};
use geo::{Area, LineString, Polygon as GeoPolygon};

/// Geschlossener Umriss des tatsächlich vermessenen Bereichs.
///
/// Die letzte Ecke ist implizit mit der ersten verbunden. Selbstüberschneidungen
/// werden weder angenommen noch geprüft.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaPolygon {
    points: Vec<Point2D>,
}

impl AreaPolygon {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Rechteck, das jedes Pixel eines `width` x `height` Rasters enthält.
    pub fn full_grid(width: usize, height: usize) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self::new(vec![
            Point2D::new(-0.5, -0.5),
            Point2D::new(w, -0.5),
            Point2D::new(w, h),
            Point2D::new(-0.5, h),
        ])
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    pub fn translated(&self, offset: &Offset) -> Self {
        Self::new(self.points.iter().map(|p| *p + *offset).collect())
    }

    /// Even-Odd-Regel per horizontalem Strahl.
    ///
    /// Punkte exakt auf einer Kante werden nicht gesondert behandelt und können
    /// je nach Kante innen oder außen landen.
    pub fn is_point_in_polygon(&self, point: &Point2D) -> bool {
        let n = self.points.len();
        if n == 0 {
            return false;
        }
        let mut result = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = &self.points[i];
            let pj = &self.points[j];
            if (pi.y > point.y) != (pj.y > point.y)
                && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                result = !result;
            }
            j = i;
        }
        result
    }

    /// Fläche des Umrisses in Pixel².
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let exterior: LineString<f64> = self.points.iter().map(|p| (p.x, p.y)).collect();
        GeoPolygon::new(exterior, vec![]).unsigned_area()
    }
}

impl From<Vec<Point2D>> for AreaPolygon {
    fn from(points: Vec<Point2D>) -> Self {
        Self::new(points)
    }
}
