// src/heatmap/engine.rs

use crate::concurrent::{CompletionBarrier, CompletionGuard, ProgressCounter, ProgressSink};
use crate::heatmap::{grid::ScalarGrid, grid::SharedGrid, locator::TriangleLocator};
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::Point2D,
    utils::constants::{MAX_PIXELS_PER_TASK, MIN_THREAD_COUNT},
};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Halboffenes Pixelrechteck `[start_x, end_x) x [start_y, end_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub start_x: usize,
    pub end_x: usize,
    pub start_y: usize,
    pub end_y: usize,
}

impl PixelRect {
    pub fn new(start_x: usize, end_x: usize, start_y: usize, end_y: usize) -> Self {
        Self {
            start_x,
            end_x,
            start_y,
            end_y,
        }
    }

    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, width, 0, height)
    }

    pub fn width(&self) -> usize {
        self.end_x - self.start_x
    }

    pub fn height(&self) -> usize {
        self.end_y - self.start_y
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Zerlegt in vier Quadranten, falls das Rechteck mehr als `max_pixels`
    /// Pixel hat und beide Mittellinien echt innerhalb liegen.
    pub fn split(&self, max_pixels: usize) -> Option<[PixelRect; 4]> {
        let divide_x = self.start_x + self.width() / 2;
        let divide_y = self.start_y + self.height() / 2;
        let splittable = divide_x > self.start_x
            && divide_x < self.end_x
            && divide_y > self.start_y
            && divide_y < self.end_y;
        if self.pixel_count() <= max_pixels || !splittable {
            return None;
        }
        Some([
            Self::new(self.start_x, divide_x, self.start_y, divide_y),
            Self::new(divide_x, self.end_x, self.start_y, divide_y),
            Self::new(self.start_x, divide_x, divide_y, self.end_y),
            Self::new(divide_x, self.end_x, divide_y, self.end_y),
        ])
    }
}

/// Einstellungen des Schedulers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub thread_count: usize,
    pub max_pixels_per_task: usize,
    pub completion_timeout: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            thread_count: default_thread_count(),
            max_pixels_per_task: MAX_PIXELS_PER_TASK,
            completion_timeout: None,
        }
    }
}

/// Ein Worker pro verfügbarem Kern, mindestens `MIN_THREAD_COUNT`.
pub fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_THREAD_COUNT)
        .max(MIN_THREAD_COUNT)
}

/// Kennzahlen eines Interpolationslaufs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InterpolationStats {
    pub leaf_tasks: usize,
    pub branch_tasks: usize,
    pub failed_tasks: usize,
    pub unresolved_pixels: usize,
    pub resolved_triangles: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct InterpolationOutcome {
    pub grid: ScalarGrid,
    pub stats: InterpolationStats,
}

/// Gemeinsamer Zustand aller Tasks eines Laufs.
struct RunContext {
    locator: TriangleLocator,
    grid: SharedGrid,
    barrier: Arc<CompletionBarrier>,
    progress: ProgressCounter,
    max_pixels_per_task: usize,
    leaf_tasks: AtomicUsize,
    branch_tasks: AtomicUsize,
    failed_tasks: AtomicUsize,
}

/// Verteilt die Interpolation aller Pixel rekursiv in Quadranten auf einen
/// festen Worker-Pool.
pub struct InterpolationEngine {
    pool: ThreadPool,
    settings: EngineSettings,
}

impl InterpolationEngine {
    pub fn new(settings: EngineSettings) -> HeatmapResult<Self> {
        if settings.thread_count == 0 {
            return Err(HeatmapError::InvalidConfiguration {
                message: "thread_count must be at least 1".to_string(),
            });
        }
        if settings.max_pixels_per_task == 0 {
            return Err(HeatmapError::InvalidConfiguration {
                message: "max_pixels_per_task must be at least 1".to_string(),
            });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.thread_count)
            .thread_name(|index| format!("heatmap-worker-{}", index))
            .panic_handler(|_| error!("Interpolation task panicked, its cells stay NaN"))
            .build()
            .map_err(|e| HeatmapError::WorkerPool {
                reason: e.to_string(),
            })?;
        debug!("Worker pool created with {} threads", settings.thread_count);
        Ok(Self { pool, settings })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Füllt ein `width x height` Raster. Blockiert, bis alle Tasks fertig sind.
    ///
    /// Pixel ohne umgebendes Dreieck oder aus einem fehlgeschlagenen Task
    /// bleiben `NaN`. Nur ein Timeout der Barriere bricht den Lauf ab.
    pub fn interpolate(
        &self,
        locator: TriangleLocator,
        width: usize,
        height: usize,
        progress: Arc<dyn ProgressSink>,
    ) -> HeatmapResult<InterpolationOutcome> {
        let started = Instant::now();
        let barrier = Arc::new(CompletionBarrier::new());
        let context = Arc::new(RunContext {
            locator,
            grid: SharedGrid::new(width, height),
            barrier: Arc::clone(&barrier),
            progress: ProgressCounter::new((width * height) as u64, progress),
            max_pixels_per_task: self.settings.max_pixels_per_task,
            leaf_tasks: AtomicUsize::new(0),
            branch_tasks: AtomicUsize::new(0),
            failed_tasks: AtomicUsize::new(0),
        });

        info!("Starting interpolation of {}x{} grid...", width, height);
        barrier.before_submit(1);
        let root = Arc::clone(&context);
        self.pool
            .spawn(move || run_task(root, PixelRect::full(width, height)));

        match self.settings.completion_timeout {
            Some(timeout) => barrier.await_completion_timeout(timeout)?,
            None => barrier.await_completion(),
        }

        let grid = context.grid.snapshot();
        let stats = InterpolationStats {
            leaf_tasks: context.leaf_tasks.load(Ordering::Relaxed),
            branch_tasks: context.branch_tasks.load(Ordering::Relaxed),
            failed_tasks: context.failed_tasks.load(Ordering::Relaxed),
            unresolved_pixels: grid.nan_count(),
            resolved_triangles: context.locator.cache_misses(),
            elapsed: started.elapsed(),
        };
        if stats.unresolved_pixels > 0 {
            warn!(
                "{} of {} pixels could not be interpolated",
                stats.unresolved_pixels,
                grid.len()
            );
        }
        info!(
            "Interpolation of heatmap values completed in {:?} ({} leaf tasks, {} branch tasks)",
            stats.elapsed, stats.leaf_tasks, stats.branch_tasks
        );
        Ok(InterpolationOutcome { grid, stats })
    }
}

fn run_task(context: Arc<RunContext>, rect: PixelRect) {
    let _guard = CompletionGuard::new(Arc::clone(&context.barrier));

    if let Some(quadrants) = rect.split(context.max_pixels_per_task) {
        debug!("Delegating to 4 new tasks: pixel count {} is above threshold", rect.pixel_count());
        context.branch_tasks.fetch_add(1, Ordering::Relaxed);
        context.barrier.before_submit(quadrants.len());
        for quadrant in quadrants {
            let child = Arc::clone(&context);
            // Innerhalb eines Pool-Threads landet der Task im selben Pool
            rayon::spawn(move || run_task(child, quadrant));
        }
        return;
    }

    context.leaf_tasks.fetch_add(1, Ordering::Relaxed);
    if let Err(e) = interpolate_rect(&context, rect) {
        context.failed_tasks.fetch_add(1, Ordering::Relaxed);
        error!("Interpolation of {:?} aborted: {}", rect, e);
    }
}

fn interpolate_rect(context: &RunContext, rect: PixelRect) -> HeatmapResult<()> {
    debug!(
        "Interpolating for x-range [{}, {}[ and y-range [{}, {}[...",
        rect.start_x, rect.end_x, rect.start_y, rect.end_y
    );
    for y in rect.start_y..rect.end_y {
        for x in rect.start_x..rect.end_x {
            let value = context
                .locator
                .interpolate(&Point2D::new(x as f64, y as f64))?;
            context.grid.set(x, y, value);
        }
        context.progress.advance(rect.width() as u64);
    }
    debug!(
        "Interpolation for x-range [{}, {}[ and y-range [{}, {}[ completed",
        rect.start_x, rect.end_x, rect.start_y, rect.end_y
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrent::NoProgress;
    use crate::heatmap::{
        sample::Sample,
        triangulation::{SpadeTriangulator, TriangulationProvider},
    };
    use crate::math::utils::constants::FUZZY_WIDTH;
    use approx::assert_relative_eq;
    use parking_lot::Mutex;

    fn locator_for(samples: Vec<Sample>) -> TriangleLocator {
        let points: Vec<Point2D> = samples.iter().map(|s| s.position).collect();
        let mesh = SpadeTriangulator::new().triangulate(&points).unwrap();
        TriangleLocator::new(mesh, samples, FUZZY_WIDTH)
    }

    fn plane_samples(size: usize) -> Vec<Sample> {
        // f(x, y) = x + 2y ist linear und wird exakt interpoliert
        let s = size as f64;
        [(-1.0, -1.0), (-1.0, s), (s, -1.0), (s, s), (s / 3.0, s / 2.0)]
            .iter()
            .map(|&(x, y)| Sample::new(x, y, x + 2.0 * y, 0.0))
            .collect()
    }

    fn settings(max_pixels_per_task: usize) -> EngineSettings {
        EngineSettings {
            thread_count: 4,
            max_pixels_per_task,
            completion_timeout: Some(Duration::from_secs(30)),
        }
    }

    #[test]
    fn test_split_respects_threshold_and_bounds() {
        let rect = PixelRect::full(10, 10);
        assert!(rect.split(100).is_none());
        let quadrants = rect.split(99).unwrap();
        assert_eq!(quadrants[0], PixelRect::new(0, 5, 0, 5));
        assert_eq!(quadrants[3], PixelRect::new(5, 10, 5, 10));
        let total: usize = quadrants.iter().map(PixelRect::pixel_count).sum();
        assert_eq!(total, 100);

        // Eine Spalte lässt sich nicht in vier echte Quadranten teilen
        assert!(PixelRect::full(1, 50_000).split(10).is_none());
    }

    #[test]
    fn test_engine_rejects_zero_threads() {
        let result = InterpolationEngine::new(EngineSettings {
            thread_count: 0,
            ..EngineSettings::default()
        });
        assert!(matches!(result, Err(HeatmapError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_linear_field_is_reproduced_with_recursive_split() {
        let size = 64;
        let engine = InterpolationEngine::new(settings(100)).unwrap();
        let outcome = engine
            .interpolate(locator_for(plane_samples(size)), size, size, Arc::new(NoProgress))
            .unwrap();

        assert!(outcome.stats.branch_tasks > 0);
        assert_eq!(outcome.stats.unresolved_pixels, 0);
        assert_eq!(outcome.stats.failed_tasks, 0);
        for (x, y, value) in outcome.grid.iter() {
            let expected = x as f64 + 2.0 * y as f64;
            assert_relative_eq!(value, expected, epsilon = 1e-6, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_progress_reaches_one_hundred_percent() {
        let size = 40;
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let reports = Arc::clone(&reports);
            move |percent: f64| reports.lock().push(percent)
        };
        let engine = InterpolationEngine::new(settings(50)).unwrap();
        engine
            .interpolate(locator_for(plane_samples(size)), size, size, Arc::new(sink))
            .unwrap();

        let reports = reports.lock();
        assert!(!reports.is_empty());
        let max = reports.iter().copied().fold(f64::MIN, f64::max);
        assert_relative_eq!(max, 100.0);
    }

    #[test]
    fn test_single_leaf_for_small_grid() {
        let size = 8;
        let engine = InterpolationEngine::new(settings(MAX_PIXELS_PER_TASK)).unwrap();
        let outcome = engine
            .interpolate(locator_for(plane_samples(size)), size, size, Arc::new(NoProgress))
            .unwrap();
        assert_eq!(outcome.stats.leaf_tasks, 1);
        assert_eq!(outcome.stats.branch_tasks, 0);
    }

    #[test]
    fn test_failing_leaves_leave_nan_and_still_complete() {
        let size = 20;
        let samples = plane_samples(size);
        let points: Vec<Point2D> = samples.iter().map(|s| s.position).collect();
        let mesh = SpadeTriangulator::new().triangulate(&points).unwrap();
        // Ohne Messungen schlägt die Eckenauflösung in jedem Blatt fehl
        let locator = TriangleLocator::new(mesh, Vec::new(), FUZZY_WIDTH);

        let engine = InterpolationEngine::new(settings(10)).unwrap();
        let outcome = engine
            .interpolate(locator, size, size, Arc::new(NoProgress))
            .unwrap();

        assert!(outcome.stats.leaf_tasks > 1);
        assert_eq!(outcome.stats.failed_tasks, outcome.stats.leaf_tasks);
        assert_eq!(outcome.grid.nan_count(), size * size);
        assert_eq!(outcome.stats.unresolved_pixels, size * size);
    }

    #[test]
    fn test_completion_timeout_aborts_the_run() {
        let size = 1000;
        let engine = InterpolationEngine::new(EngineSettings {
            thread_count: 2,
            max_pixels_per_task: MAX_PIXELS_PER_TASK,
            completion_timeout: Some(Duration::from_micros(1)),
        })
        .unwrap();
        let result = engine.interpolate(locator_for(plane_samples(size)), size, size, Arc::new(NoProgress));
        assert!(matches!(
            result,
            Err(HeatmapError::ConcurrencyTimeout { outstanding, .. }) if outstanding > 0
        ));
    }
}
