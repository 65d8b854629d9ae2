// src/heatmap/pipeline.rs

use crate::concurrent::{NoProgress, ProgressSink};
use crate::heatmap::{
    boundary::BoundarySynthesizer,
    color::{ColorSelector, ValueBounds, find_min_and_max_values},
    config::HeatmapConfig,
    engine::InterpolationEngine,
    grid::ScalarGrid,
    layout::GridLayout,
    locator::TriangleLocator,
    polygon::AreaPolygon,
    render::HeatmapRenderer,
    sample::Sample,
    triangulation::{SpadeTriangulator, TriangleMesh, TriangulationProvider},
};
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::{Offset, Point2D},
};
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Liefert die Eingaben eines Generierungslaufs.
///
/// Koordinaten sind natürliche Pixelkoordinaten; das Offset verschiebt sie in
/// den nicht-negativen Bereich des Rasters.
pub trait SampleSource: Send + Sync {
    fn samples(&self) -> HeatmapResult<Vec<Sample>>;

    fn grid_size(&self) -> (usize, usize);

    fn offset(&self) -> Offset;

    /// Vermessene Fläche in natürlichen Koordinaten. `None` färbt das ganze Raster.
    fn area(&self) -> Option<AreaPolygon> {
        None
    }
}

/// Feste Messmenge im Speicher.
#[derive(Debug, Clone)]
pub struct MeasurementSet {
    samples: Vec<Sample>,
    area: Option<AreaPolygon>,
    size_x: usize,
    size_y: usize,
    offset: Offset,
}

impl MeasurementSet {
    pub fn new(samples: Vec<Sample>, size_x: usize, size_y: usize) -> Self {
        Self {
            samples,
            area: None,
            size_x,
            size_y,
            offset: Offset::zeros(),
        }
    }

    /// Messungen und Flächenpunkte in Metern; Rastergröße und Offset folgen aus [`GridLayout::fit`].
    pub fn from_world(samples: &[Sample], area_points: &[Point2D], pixels_per_meter: f64) -> HeatmapResult<Self> {
        let positions: Vec<Point2D> = samples.iter().map(|s| s.position).collect();
        let layout = GridLayout::fit(&positions, area_points, pixels_per_meter)?;
        let area = if area_points.is_empty() {
            None
        } else {
            Some(AreaPolygon::new(
                area_points.iter().map(|p| layout.to_natural(p)).collect(),
            ))
        };
        Ok(Self {
            samples: layout.samples_to_natural(samples),
            area,
            size_x: layout.size_x,
            size_y: layout.size_y,
            offset: layout.offset,
        })
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_area(mut self, area: AreaPolygon) -> Self {
        self.area = Some(area);
        self
    }
}

impl SampleSource for MeasurementSet {
    fn samples(&self) -> HeatmapResult<Vec<Sample>> {
        Ok(self.samples.clone())
    }

    fn grid_size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    fn offset(&self) -> Offset {
        self.offset
    }

    fn area(&self) -> Option<AreaPolygon> {
        self.area.clone()
    }
}

/// Kennzahlen eines vollständigen Laufs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub sample_count: usize,
    pub triangle_count: usize,
    pub leaf_tasks: usize,
    pub branch_tasks: usize,
    pub failed_tasks: usize,
    pub resolved_triangles: usize,
    pub unresolved_pixels: usize,
    pub value_bounds: ValueBounds,
    /// Fläche der Maske in Pixel²
    pub masked_area: f64,
    pub triangulation_time: Duration,
    pub interpolation_time: Duration,
    pub render_time: Duration,
    pub total_time: Duration,
}

/// Ergebnis eines Laufs: Raster, Bild und alles für spätere Rückprojektion.
#[derive(Debug, Clone)]
pub struct HeatmapProduct {
    pub grid: ScalarGrid,
    pub image: RgbaImage,
    pub offset: Offset,
    pub area: AreaPolygon,
    pub mesh: TriangleMesh,
    /// Messungen in Rasterkoordinaten, inklusive der vier Eckpunkte
    pub samples: Vec<Sample>,
    pub report: GenerationReport,
}

impl HeatmapProduct {
    pub fn size(&self) -> (usize, usize) {
        (self.grid.width(), self.grid.height())
    }

    /// Wert einer Rasterzelle; `None` außerhalb oder bei `NaN`.
    pub fn value_at_grid(&self, x: usize, y: usize) -> Option<f64> {
        self.grid.get(x, y).filter(|v| !v.is_nan())
    }

    pub fn to_grid(&self, natural: &Point2D) -> Point2D {
        *natural + self.offset
    }

    /// Wert an einem Punkt in natürlichen Koordinaten.
    ///
    /// Gebrochene Rasterkoordinaten werden abgeschnitten (abgerundet); ein
    /// Punkt, der auf die Rasterkoordinate `(3.9, 5.2)` fällt, liest also die Zelle `(3, 5)`.
    pub fn value_at(&self, natural: &Point2D) -> Option<f64> {
        let p = self.to_grid(natural);
        if !(p.x >= 0.0 && p.y >= 0.0) {
            return None;
        }
        self.value_at_grid(p.x as usize, p.y as usize)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> HeatmapResult<()> {
        self.image.save(path)?;
        Ok(())
    }
}

/// Rückmeldungen eines asynchronen Laufs. Pro Lauf kommt genau eine der
/// Meldungen `on_finished` oder `on_error`.
pub trait GenerationCallback: Send + Sync {
    fn on_interpolation_progress(&self, _percent: f64) {}

    fn on_render_progress(&self, _percent: f64) {}

    fn on_finished(&self, product: HeatmapProduct);

    fn on_error(&self, error: HeatmapError);
}

struct InterpolationProgress(Arc<dyn GenerationCallback>);

impl ProgressSink for InterpolationProgress {
    fn report(&self, percent: f64) {
        self.0.on_interpolation_progress(percent);
    }
}

struct RenderProgress(Arc<dyn GenerationCallback>);

impl ProgressSink for RenderProgress {
    fn report(&self, percent: f64) {
        self.0.on_render_progress(percent);
    }
}

/// Verkettet Randsynthese, Triangulation, Interpolation und Rendering.
#[derive(Clone)]
pub struct HeatmapPipeline {
    config: HeatmapConfig,
    triangulator: Arc<dyn TriangulationProvider>,
}

impl HeatmapPipeline {
    pub fn new(config: HeatmapConfig) -> HeatmapResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            triangulator: Arc::new(SpadeTriangulator::new()),
        })
    }

    pub fn with_triangulator(mut self, triangulator: Arc<dyn TriangulationProvider>) -> Self {
        self.triangulator = triangulator;
        self
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn generate(&self, source: &dyn SampleSource) -> HeatmapResult<HeatmapProduct> {
        self.generate_with_progress(source, Arc::new(NoProgress), Arc::new(NoProgress))
    }

    /// Blockierender Lauf mit getrennten Fortschrittsmeldungen für beide Phasen.
    pub fn generate_with_progress(
        &self,
        source: &dyn SampleSource,
        interpolation_progress: Arc<dyn ProgressSink>,
        render_progress: Arc<dyn ProgressSink>,
    ) -> HeatmapResult<HeatmapProduct> {
        let started = Instant::now();
        let (size_x, size_y) = source.grid_size();
        if size_x == 0 || size_y == 0 {
            return Err(HeatmapError::InvalidConfiguration {
                message: format!("grid size {}x{} is empty", size_x, size_y),
            });
        }
        let offset = source.offset();
        let measured: Vec<Sample> = source.samples()?.iter().map(|s| s.translated(&offset)).collect();
        if measured.is_empty() {
            return Err(HeatmapError::EmptySampleSet);
        }
        info!(
            "Generating {}x{} heatmap from {} samples",
            size_x,
            size_y,
            measured.len()
        );

        let boundary = BoundarySynthesizer::new(self.config.external_point_strategy)
            .with_power_range(self.config.min_power, self.config.max_power)
            .synthesize(size_x, size_y, &measured)?;
        let mut samples = measured;
        let sample_count = samples.len();
        samples.extend_from_slice(&boundary);

        let triangulation_started = Instant::now();
        let points: Vec<Point2D> = samples.iter().map(|s| s.position).collect();
        let mesh = self.triangulator.triangulate(&points)?;
        let triangulation_time = triangulation_started.elapsed();

        let engine = InterpolationEngine::new(self.config.engine_settings())?;
        let locator = TriangleLocator::new(mesh.clone(), samples.clone(), self.config.fuzzy_width);
        let outcome = engine.interpolate(locator, size_x, size_y, interpolation_progress)?;

        let area = match source.area() {
            Some(area) => area.translated(&offset),
            None => AreaPolygon::full_grid(size_x, size_y),
        };
        let value_bounds = find_min_and_max_values(&area, &outcome.grid)?;
        let selector = ColorSelector::new(
            self.config.color_mode,
            &self.config.gradient_colors,
            self.config.gradient_width,
            Some(value_bounds),
        )?;

        let render_started = Instant::now();
        let grid = Arc::new(outcome.grid);
        let image = HeatmapRenderer::new(area.clone(), selector)
            .spawn(Arc::clone(&grid), render_progress)?
            .join()
            .map_err(|_| HeatmapError::WorkerPool {
                reason: "render thread panicked".to_string(),
            })??;
        let render_time = render_started.elapsed();

        let report = GenerationReport {
            sample_count,
            triangle_count: mesh.len(),
            leaf_tasks: outcome.stats.leaf_tasks,
            branch_tasks: outcome.stats.branch_tasks,
            failed_tasks: outcome.stats.failed_tasks,
            resolved_triangles: outcome.stats.resolved_triangles,
            unresolved_pixels: outcome.stats.unresolved_pixels,
            value_bounds,
            masked_area: area.area(),
            triangulation_time,
            interpolation_time: outcome.stats.elapsed,
            render_time,
            total_time: started.elapsed(),
        };
        info!(
            "Heatmap generated in {:?}: {} triangles, values in [{:e}, {:e}]",
            report.total_time, report.triangle_count, value_bounds.min, value_bounds.max
        );

        Ok(HeatmapProduct {
            grid: Arc::unwrap_or_clone(grid),
            image,
            offset,
            area,
            mesh,
            samples,
            report,
        })
    }

    /// Startet den Lauf auf einem eigenen Thread und meldet das Ergebnis über `callback`.
    pub fn generate_async(
        &self,
        source: Arc<dyn SampleSource>,
        callback: Arc<dyn GenerationCallback>,
    ) -> HeatmapResult<JoinHandle<()>> {
        let pipeline = self.clone();
        let handle = thread::Builder::new()
            .name("heatmap-generation".to_string())
            .spawn(move || {
                let result = pipeline.generate_with_progress(
                    source.as_ref(),
                    Arc::new(InterpolationProgress(Arc::clone(&callback))),
                    Arc::new(RenderProgress(Arc::clone(&callback))),
                );
                match result {
                    Ok(product) => callback.on_finished(product),
                    Err(e) => {
                        error!("Heatmap generation failed: {}", e);
                        callback.on_error(e);
                    }
                }
            })?;
        Ok(handle)
    }
}
