// src/heatmap/locator.rs

use crate::heatmap::{
    barycentric::interpolate_value_at,
    sample::{Sample, find_closest_sample},
    triangulation::{Triangle, TriangleMesh},
};
use crate::math::{error::HeatmapResult, types::Point2D};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Unscharfer Enthaltenseins-Test, tolerant gegenüber Rundungsfehlern.
///
/// Zuerst eine grobe Bounding-Box-Prüfung (um `fuzzy_width` erweitert), dann der
/// exakte Test. Schlägt dieser fehl, werden acht um `fuzzy_width` versetzte
/// Probepunkte geprüft, erst als +, dann als X. Trifft einer, gilt der Punkt als
/// enthalten. Dadurch werden Punkte bis zu `fuzzy_width * sqrt(2)` außerhalb
/// einer Ecke noch akzeptiert.
pub fn fuzzy_is_point_in_triangle(point: &Point2D, triangle: &Triangle, fuzzy_width: f64) -> bool {
    if !triangle.bounds().expand(fuzzy_width).contains_point(point) {
        return false;
    }
    if triangle.contains(point) {
        return true;
    }
    let w = fuzzy_width;
    let plus = [(0.0, w), (w, 0.0), (0.0, -w), (-w, 0.0)];
    let cross = [(w, w), (w, -w), (-w, w), (-w, -w)];
    plus.iter()
        .chain(cross.iter())
        .any(|(dx, dy)| triangle.contains(&Point2D::new(point.x + dx, point.y + dy)))
}

/// Sucht für Pixel das umgebende Dreieck und löst dessen Ecken in Messungen auf.
///
/// Die Auflösung (nächste Messung je Ecke) ist teuer und wird pro Dreieck
/// zwischengespeichert. Zwei Worker, die gleichzeitig auf ein unbekanntes Dreieck
/// treffen, rechnen es nur einmal; Worker auf verschiedenen Dreiecken blockieren
/// sich nicht.
pub struct TriangleLocator {
    mesh: TriangleMesh,
    samples: Vec<Sample>,
    fuzzy_width: f64,
    resolved: DashMap<Triangle, [Sample; 3]>,
    // Ein Lock pro Dreieck, gleicher Index wie im Mesh
    resolve_locks: Vec<Mutex<()>>,
    cache_misses: AtomicUsize,
    unresolved_pixels: AtomicUsize,
}

impl TriangleLocator {
    pub fn new(mesh: TriangleMesh, samples: Vec<Sample>, fuzzy_width: f64) -> Self {
        let resolve_locks = (0..mesh.len()).map(|_| Mutex::new(())).collect();
        Self {
            resolved: DashMap::with_capacity(mesh.len()),
            mesh,
            samples,
            fuzzy_width,
            resolve_locks,
            cache_misses: AtomicUsize::new(0),
            unresolved_pixels: AtomicUsize::new(0),
        }
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Erstes Dreieck in Mesh-Reihenfolge, das den Punkt (unscharf) enthält.
    pub fn find_triangle_containing(&self, point: &Point2D) -> Option<(usize, &Triangle)> {
        self.mesh
            .triangles()
            .iter()
            .enumerate()
            .find(|(_, triangle)| fuzzy_is_point_in_triangle(point, triangle, self.fuzzy_width))
    }

    /// Messungen zu den drei Ecken des Dreiecks `index`, mit Double-Checked Locking.
    pub fn resolve_vertices(&self, index: usize, triangle: &Triangle) -> HeatmapResult<[Sample; 3]> {
        if let Some(cached) = self.resolved.get(triangle) {
            return Ok(*cached);
        }
        let _guard = self.resolve_locks[index].lock();
        if let Some(cached) = self.resolved.get(triangle) {
            return Ok(*cached);
        }

        debug!(
            "Samples for triangle {:?} not cached yet, searching closest samples to vertices",
            triangle
        );
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        let resolved = [
            *find_closest_sample(&self.samples, &triangle.a)?,
            *find_closest_sample(&self.samples, &triangle.b)?,
            *find_closest_sample(&self.samples, &triangle.c)?,
        ];
        self.resolved.insert(*triangle, resolved);
        Ok(resolved)
    }

    /// Interpolierter Wert am Punkt oder `NaN`, falls kein Dreieck ihn enthält.
    pub fn interpolate(&self, point: &Point2D) -> HeatmapResult<f64> {
        let Some((index, triangle)) = self.find_triangle_containing(point) else {
            warn!("Unable to find triangle containing point ({}, {})", point.x, point.y);
            self.unresolved_pixels.fetch_add(1, Ordering::Relaxed);
            return Ok(f64::NAN);
        };
        let vertices = self.resolve_vertices(index, triangle)?;
        Ok(interpolate_value_at(point, &vertices))
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn unresolved_pixels(&self) -> usize {
        self.unresolved_pixels.load(Ordering::Relaxed)
    }
}
