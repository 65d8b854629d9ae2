// src/heatmap/barycentric.rs

use crate::heatmap::sample::Sample;
use crate::math::types::Point2D;
use nalgebra::distance;
use tracing::trace;

/// Fläche eines Dreiecks nach der Formel von Heron.
///
/// Für nahezu entartete Dreiecke kann die Auslöschung `NaN` liefern; dann wird
/// `0` angenommen.
pub fn triangle_area(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    let side_a = distance(b, c);
    let side_b = distance(c, a);
    let side_c = distance(a, b);
    let s = (side_a + side_b + side_c) / 2.0;
    let result = (s * (s - side_a) * (s - side_b) * (s - side_c)).sqrt();
    if result.is_nan() {
        trace!(
            "Area for triangle ({:?}, {:?}, {:?}) is NaN, assuming 0",
            a, b, c
        );
        0.0
    } else {
        result
    }
}

/// Baryzentrische Interpolation der Leistung am Punkt `point` innerhalb des
/// Dreiecks der drei Messungen.
///
/// Kann für extrem flache Dreiecke `NaN` liefern (Fläche 0 im Nenner).
pub fn interpolate_value_at(point: &Point2D, vertices: &[Sample; 3]) -> f64 {
    let [a, b, c] = vertices;
    let area_complete = triangle_area(&a.position, &b.position, &c.position);
    let area_a = triangle_area(point, &b.position, &c.position);
    let area_b = triangle_area(point, &a.position, &c.position);
    let area_c = triangle_area(point, &a.position, &b.position);
    let weighted_sum = area_a * a.power + area_b * b.power + area_c * c.power;
    weighted_sum / area_complete
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_triangle_area_calculation() {
        let area = triangle_area(
            &Point2D::new(0.0, 4.0),
            &Point2D::new(3.0, 0.0),
            &Point2D::new(0.0, 0.0),
        );
        assert_abs_diff_eq!(area, 6.0, epsilon = 1e-11);
    }

    #[test]
    fn test_triangle_area_matches_shoelace() {
        let (a, b, c) = (
            Point2D::new(1.5, -2.0),
            Point2D::new(7.25, 3.0),
            Point2D::new(-4.0, 5.5),
        );
        let shoelace =
            0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs();
        assert_relative_eq!(triangle_area(&a, &b, &c), shoelace, max_relative = 1e-12);
    }

    #[test]
    fn test_degenerate_triangle_area_is_zero_not_nan() {
        let area = triangle_area(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(1.0, 1.0),
            &Point2D::new(2.0, 2.0),
        );
        assert!(!area.is_nan());
        assert_eq!(area, 0.0);

        // Fast kollinear, provoziert negative Produkte durch Rundung
        let area = triangle_area(
            &Point2D::new(0.1, 0.1),
            &Point2D::new(0.7, 0.7),
            &Point2D::new(0.3, 0.3),
        );
        assert!(!area.is_nan());
        assert_abs_diff_eq!(area, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interpolation_is_exact_at_vertices() {
        let vertices = [
            Sample::new(0.0, 0.0, 1.0, 0.0),
            Sample::new(10.0, 0.0, 5.0, 0.0),
            Sample::new(3.0, 8.0, 9.0, 0.0),
        ];
        for vertex in &vertices {
            let value = interpolate_value_at(&vertex.position, &vertices);
            assert_relative_eq!(value, vertex.power, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_interpolation_at_centroid_is_mean() {
        let vertices = [
            Sample::new(0.0, 0.0, 3.0, 0.0),
            Sample::new(6.0, 0.0, 6.0, 0.0),
            Sample::new(0.0, 6.0, 9.0, 0.0),
        ];
        let centroid = Point2D::new(2.0, 2.0);
        assert_relative_eq!(interpolate_value_at(&centroid, &vertices), 6.0, max_relative = 1e-12);
    }

    #[test]
    fn test_interpolation_on_flat_triangle_is_nan() {
        let vertices = [
            Sample::new(0.0, 0.0, 3.0, 0.0),
            Sample::new(1.0, 0.0, 6.0, 0.0),
            Sample::new(2.0, 0.0, 9.0, 0.0),
        ];
        assert!(interpolate_value_at(&Point2D::new(0.5, 0.0), &vertices).is_nan());
    }
}
