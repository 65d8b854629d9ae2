// src/heatmap/triangulation.rs

use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::{Bounds2D, Point2D, SpadePoint, cross, from_spade_point, point_bits, to_spade_points},
};
use spade::{DelaunayTriangulation, Triangulation};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use tracing::{debug, info};

/// Repräsentiert ein einzelnes Dreieck, definiert durch drei 2D-Punkte.
///
/// Gleichheit und Hash beruhen auf den exakten Bitmustern der Koordinaten,
/// damit ein Dreieck als Schlüssel einer Cache-Tabelle dienen kann.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub a: Point2D,
    pub b: Point2D,
    pub c: Point2D,
}

impl Triangle {
    pub fn new(a: Point2D, b: Point2D, c: Point2D) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [Point2D; 3] {
        [self.a, self.b, self.c]
    }

    pub fn bounds(&self) -> Bounds2D {
        let mut bounds = Bounds2D::empty();
        for vertex in self.vertices() {
            bounds.expand_to_include_point(vertex);
        }
        bounds
    }

    /// Exakter Enthaltenseins-Test über die Vorzeichen der drei Kreuzprodukte.
    ///
    /// Punkte genau auf einer Kante ergeben ein Vorzeichen von 0 und gelten als
    /// außerhalb; dafür gibt es die unscharfe Prüfung im Locator.
    pub fn contains(&self, point: &Point2D) -> bool {
        let pab = cross(point, &self.a, &self.b).signum_or_zero();
        let pbc = cross(point, &self.b, &self.c).signum_or_zero();
        if pab != pbc {
            return false;
        }
        let pca = cross(point, &self.c, &self.a).signum_or_zero();
        pab == pca
    }

    fn key(&self) -> [(u64, u64); 3] {
        [point_bits(&self.a), point_bits(&self.b), point_bits(&self.c)]
    }
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Triangle {}

impl Hash for Triangle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

trait SignumOrZero {
    fn signum_or_zero(self) -> i8;
}

impl SignumOrZero for f64 {
    fn signum_or_zero(self) -> i8 {
        if self > 0.0 {
            1
        } else if self < 0.0 {
            -1
        } else {
            0
        }
    }
}

/// Unveränderliche Dreiecksmenge eines Generierungslaufs.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
}

impl TriangleMesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Summe der Dreiecksflächen
    pub fn total_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| 0.5 * cross(&t.a, &t.b, &t.c).abs())
            .sum()
    }
}

/// Austauschbare Delaunay-Triangulation.
///
/// Eingabe: eindeutige Punkte (mindestens 3, nicht kollinear). Ausgabe: Dreiecke,
/// deren Vereinigung die konvexe Hülle ist und die die Umkreisbedingung erfüllen.
pub trait TriangulationProvider: Send + Sync {
    fn triangulate(&self, points: &[Point2D]) -> HeatmapResult<TriangleMesh>;
}

/// Triangulation über `spade`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpadeTriangulator;

impl SpadeTriangulator {
    pub fn new() -> Self {
        Self
    }
}

impl TriangulationProvider for SpadeTriangulator {
    fn triangulate(&self, points: &[Point2D]) -> HeatmapResult<TriangleMesh> {
        let mut seen = HashSet::with_capacity(points.len());
        let unique: Vec<Point2D> = points
            .iter()
            .filter(|p| seen.insert(point_bits(p)))
            .copied()
            .collect();
        if unique.len() < 3 {
            return Err(HeatmapError::InsufficientPoints {
                expected: 3,
                actual: unique.len(),
            });
        }

        info!("Starting triangulation of {} points...", unique.len());
        let spade_points: Vec<SpadePoint> = to_spade_points(&unique);
        let triangulation: DelaunayTriangulation<SpadePoint> =
            DelaunayTriangulation::bulk_load(spade_points).map_err(|e| {
                HeatmapError::TriangulationFailed {
                    reason: format!("point insertion failed: {:?}", e),
                }
            })?;

        let triangles: Vec<Triangle> = triangulation
            .inner_faces()
            .map(|face| {
                let [a, b, c] = face.vertices();
                Triangle::new(
                    from_spade_point(a.position()),
                    from_spade_point(b.position()),
                    from_spade_point(c.position()),
                )
            })
            .collect();

        if triangles.is_empty() {
            return Err(HeatmapError::TriangulationFailed {
                reason: format!("all {} points are collinear", unique.len()),
            });
        }
        info!("Triangulation finished: {} triangles", triangles.len());
        debug!(
            "Triangulation used {} of {} input points",
            triangulation.num_vertices(),
            points.len()
        );
        Ok(TriangleMesh::new(triangles))
    }
}
