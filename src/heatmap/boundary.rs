// src/heatmap/boundary.rs

use crate::heatmap::sample::{Sample, find_closest_sample};
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::Point2D,
    utils::constants::{MAX_POWER, MIN_POWER},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Legt fest, welchen Wert die vier künstlichen Eckpunkte außerhalb des Rasters erhalten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExternalPointStrategy {
    /// Minimal darstellbare Leistung
    AssumeLow,
    /// Leistung der geometrisch nächsten echten Messung
    #[default]
    AssumeNearest,
    /// Maximal darstellbare Leistung
    AssumeHigh,
}

/// Erzeugt Messpunkte eine Einheit außerhalb jeder Rasterecke, damit die
/// Triangulation das gesamte Raster abdeckt.
#[derive(Debug, Clone, Copy)]
pub struct BoundarySynthesizer {
    strategy: ExternalPointStrategy,
    min_power: f64,
    max_power: f64,
}

impl BoundarySynthesizer {
    pub fn new(strategy: ExternalPointStrategy) -> Self {
        Self {
            strategy,
            min_power: MIN_POWER,
            max_power: MAX_POWER,
        }
    }

    pub fn with_power_range(mut self, min_power: f64, max_power: f64) -> Self {
        self.min_power = min_power;
        self.max_power = max_power;
        self
    }

    /// Eckpunkte in der Reihenfolge `(-1,-1)`, `(-1,size_y)`, `(size_x,-1)`, `(size_x,size_y)`.
    ///
    /// Jeder Eckpunkt übernimmt die Metadaten der nächsten echten Messung, daher
    /// schlägt der Aufruf mit leerer Messmenge für jede Strategie fehl.
    pub fn synthesize(
        &self,
        size_x: usize,
        size_y: usize,
        samples: &[Sample],
    ) -> HeatmapResult<[Sample; 4]> {
        if samples.is_empty() {
            return Err(HeatmapError::EmptySampleSet);
        }
        let (sx, sy) = (size_x as f64, size_y as f64);
        let corners = [
            Point2D::new(-1.0, -1.0),
            Point2D::new(-1.0, sy),
            Point2D::new(sx, -1.0),
            Point2D::new(sx, sy),
        ];

        let mut result = [Sample::new(0.0, 0.0, 0.0, 0.0); 4];
        for (slot, corner) in result.iter_mut().zip(corners) {
            let nearest = find_closest_sample(samples, &corner)?.moved_to(corner);
            *slot = match self.strategy {
                ExternalPointStrategy::AssumeNearest => nearest,
                ExternalPointStrategy::AssumeLow => nearest.with_power(self.min_power),
                ExternalPointStrategy::AssumeHigh => nearest.with_power(self.max_power),
            };
        }
        debug!(
            "Synthesized boundary samples for {}x{} grid with {:?}",
            size_x, size_y, self.strategy
        );
        Ok(result)
    }
}
