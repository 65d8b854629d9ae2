// src/math/types/point.rs
use super::*;

// --- Konvertierungsfunktionen ---

/// Konvertiert nalgebra-Punkte in Spade-Punkte.
pub fn to_spade_points(points: &[Point2D]) -> Vec<SpadePoint> {
    points.iter().map(|p| SpadePoint::new(p.x, p.y)).collect()
}

pub fn from_spade_point(p: SpadePoint) -> Point2D {
    Point2D::new(p.x, p.y)
}

/// Kreuzprodukt (z-Komponente) der Vektoren `a - origin` und `b - origin`.
pub fn cross(origin: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    (a.x - origin.x) * (b.y - origin.y) - (a.y - origin.y) * (b.x - origin.x)
}

/// Bitgenauer Schlüssel eines Punktes, für Hash-Tabellen.
pub fn point_bits(p: &Point2D) -> (u64, u64) {
    (p.x.to_bits(), p.y.to_bits())
}
