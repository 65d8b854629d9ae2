// ./src/main.rs
use clap::{Parser, ValueEnum};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};
use signal_heatmap::debug::visualization::svg::write_mesh_svg;
use signal_heatmap::heatmap::{
    ColorMode, ExternalPointStrategy, GenerationCallback, HeatmapConfig, HeatmapPipeline, HeatmapProduct,
    MeasurementSet, RssiAggregate, Sample,
};
use signal_heatmap::math::{HeatmapError, HeatmapResult, Point2D, utils::scale::pixels_to_meters};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliStrategy {
    #[value(name = "low")]
    Low,
    #[value(name = "nearest")]
    Nearest,
    #[value(name = "high")]
    High,
}

impl From<CliStrategy> for ExternalPointStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Low => ExternalPointStrategy::AssumeLow,
            CliStrategy::Nearest => ExternalPointStrategy::AssumeNearest,
            CliStrategy::High => ExternalPointStrategy::AssumeHigh,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliColorMode {
    #[value(name = "bounds")]
    Bounds,
    #[value(name = "wifi-bars")]
    WifiBars,
}

impl From<CliColorMode> for ColorMode {
    fn from(value: CliColorMode) -> Self {
        match value {
            CliColorMode::Bounds => ColorMode::Bounds,
            CliColorMode::WifiBars => ColorMode::WifiBars,
        }
    }
}

/// Erzeugt eine Signal-Heatmap aus zufälligen Messungen in einem rechteckigen Raum.
#[derive(Parser, Debug)]
#[command(name = "signal-heatmap", version, about)]
struct Cli {
    /// Anzahl der Messorte
    #[arg(long, default_value_t = 12)]
    samples: usize,

    /// Breite des Raums in Metern
    #[arg(long, default_value_t = 8.0)]
    width: f64,

    /// Tiefe des Raums in Metern
    #[arg(long, default_value_t = 6.0)]
    depth: f64,

    /// Einzelmessungen pro Messort
    #[arg(long, default_value_t = 3)]
    readings: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON-Konfiguration, fehlende Felder bekommen Standardwerte
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    strategy: Option<CliStrategy>,

    #[arg(long, value_enum)]
    color_mode: Option<CliColorMode>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long, value_name = "FILE", default_value = "heatmap.png")]
    output: PathBuf,

    /// Schreibt zusätzlich die Triangulation als SVG
    #[arg(long, value_name = "FILE")]
    mesh_svg: Option<PathBuf>,
}

/// Loggt den Fortschritt in 10%-Schritten und hält das Ergebnis fest.
struct CliReporter {
    interpolation_decile: AtomicU64,
    render_decile: AtomicU64,
    result: Mutex<Option<HeatmapResult<HeatmapProduct>>>,
}

impl CliReporter {
    fn new() -> Self {
        Self {
            interpolation_decile: AtomicU64::new(0),
            render_decile: AtomicU64::new(0),
            result: Mutex::new(None),
        }
    }
}

fn log_decile(stage: &str, last: &AtomicU64, percent: f64) {
    let decile = (percent / 10.0) as u64;
    if last.fetch_max(decile, Ordering::Relaxed) < decile {
        info!("{}: {:.0}%", stage, percent);
    }
}

impl GenerationCallback for CliReporter {
    fn on_interpolation_progress(&self, percent: f64) {
        log_decile("Interpolation", &self.interpolation_decile, percent);
    }

    fn on_render_progress(&self, percent: f64) {
        log_decile("Rendering", &self.render_decile, percent);
    }

    fn on_finished(&self, product: HeatmapProduct) {
        *self.result.lock() = Some(Ok(product));
    }

    fn on_error(&self, error: HeatmapError) {
        *self.result.lock() = Some(Err(error));
    }
}

fn random_samples(cli: &Cli) -> HeatmapResult<Vec<Sample>> {
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let mut samples = Vec::with_capacity(cli.samples);
    for _ in 0..cli.samples {
        let location = Point2D::new(
            rng.random_range(0.0..cli.width),
            rng.random_range(0.0..cli.depth),
        );
        // Basiswert je Ort, die Einzelmessungen streuen um ein paar dB
        let base_rssi: f64 = rng.random_range(-85.0..-40.0);
        let mut aggregate = RssiAggregate::at(location);
        for _ in 0..cli.readings.max(1) {
            aggregate.add_value(base_rssi + rng.random_range(-3.0..3.0));
        }
        samples.push(aggregate.to_sample(2412.0)?);
    }
    Ok(samples)
}

fn build_config(cli: &Cli) -> HeatmapResult<HeatmapConfig> {
    let mut config = match &cli.config {
        Some(path) => HeatmapConfig::from_json_file(path)?,
        None => HeatmapConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config = config.with_external_point_strategy(strategy.into());
    }
    if let Some(mode) = cli.color_mode {
        config = config.with_color_mode(mode.into());
    }
    if let Some(threads) = cli.threads {
        config = config.with_thread_count(threads);
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> HeatmapResult<()> {
    let config = build_config(cli)?;
    let samples = random_samples(cli)?;
    let room = [
        Point2D::new(0.0, 0.0),
        Point2D::new(cli.width, 0.0),
        Point2D::new(cli.width, cli.depth),
        Point2D::new(0.0, cli.depth),
    ];
    let pixels_per_meter = config.pixels_per_meter;
    let source = MeasurementSet::from_world(&samples, &room, pixels_per_meter)?;

    let reporter = Arc::new(CliReporter::new());
    let pipeline = HeatmapPipeline::new(config)?;
    pipeline
        .generate_async(Arc::new(source), reporter.clone())?
        .join()
        .map_err(|_| HeatmapError::WorkerPool {
            reason: "generation thread panicked".to_string(),
        })?;

    let product = reporter
        .result
        .lock()
        .take()
        .ok_or_else(|| HeatmapError::WorkerPool {
            reason: "generation finished without result".to_string(),
        })??;

    let report = &product.report;
    let (width, height) = product.size();
    info!(
        "{}x{} pixels ({:.2} m x {:.2} m), {} triangles, {} leaf / {} branch tasks, {} unresolved pixels",
        width,
        height,
        pixels_to_meters(width as i64, pixels_per_meter),
        pixels_to_meters(height as i64, pixels_per_meter),
        report.triangle_count,
        report.leaf_tasks,
        report.branch_tasks,
        report.unresolved_pixels
    );
    product.save_png(&cli.output)?;
    info!("Heatmap written to {}", cli.output.display());

    if let Some(path) = &cli.mesh_svg {
        write_mesh_svg(&product.mesh, &product.samples, &product.area, product.size(), path)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("Heatmap generation failed: {}", e);
        std::process::exit(1);
    }
}
