// tests/pipeline.rs

use approx::assert_relative_eq;
use signal_heatmap::heatmap::{
    ExternalPointStrategy, HeatmapConfig, HeatmapPipeline, MeasurementSet, Sample, TriangleMesh,
    TriangulationProvider,
};
use signal_heatmap::math::{HeatmapError, HeatmapResult, Point2D};
use std::sync::Arc;

fn corner_samples() -> Vec<Sample> {
    vec![
        Sample::new(0.0, 0.0, 1e-6, 2412.0),
        Sample::new(9.0, 0.0, 2e-6, 2412.0),
        Sample::new(0.0, 9.0, 3e-6, 2412.0),
        Sample::new(9.0, 9.0, 4e-6, 2412.0),
    ]
}

fn pipeline(max_pixels_per_task: usize) -> HeatmapPipeline {
    let config = HeatmapConfig::default()
        .with_external_point_strategy(ExternalPointStrategy::AssumeNearest)
        .with_thread_count(4)
        .with_max_pixels_per_task(max_pixels_per_task);
    HeatmapPipeline::new(config).unwrap()
}

#[test]
fn corner_samples_fill_the_whole_grid() {
    let source = MeasurementSet::new(corner_samples(), 10, 10);
    let product = pipeline(10_000).generate(&source).unwrap();

    assert_eq!(product.size(), (10, 10));
    assert_eq!(product.grid.nan_count(), 0);
    assert!(product.grid.values().iter().all(|v| v.is_finite()));

    for sample in corner_samples() {
        let value = product
            .value_at_grid(sample.x() as usize, sample.y() as usize)
            .unwrap();
        assert_relative_eq!(value, sample.power, max_relative = 1e-9);
    }
    assert_eq!(product.report.triangle_count, product.mesh.len());
    assert_eq!(product.report.unresolved_pixels, 0);
}

#[test]
fn assume_low_pulls_edges_down() {
    let config = HeatmapConfig::default()
        .with_external_point_strategy(ExternalPointStrategy::AssumeLow)
        .with_thread_count(2);
    let source = MeasurementSet::new(vec![Sample::new(5.0, 5.0, 1e-6, 2412.0)], 11, 11);
    let product = HeatmapPipeline::new(config).unwrap().generate(&source).unwrap();

    let center = product.value_at_grid(5, 5).unwrap();
    let edge = product.value_at_grid(0, 0).unwrap();
    assert_relative_eq!(center, 1e-6, max_relative = 1e-9);
    assert!(edge < center);
    assert!(edge >= 0.0);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let samples = vec![
        Sample::new(3.0, 4.0, 1e-6, 2412.0),
        Sample::new(120.5, 17.25, 5e-7, 2412.0),
        Sample::new(64.0, 90.0, 2e-6, 2412.0),
        Sample::new(10.0, 150.0, 8e-7, 2412.0),
        Sample::new(180.0, 140.0, 3e-6, 2412.0),
    ];
    let source = MeasurementSet::new(samples, 200, 160);
    // Kleiner Schwellwert erzwingt viele parallele Teilaufgaben
    let first = pipeline(500).generate(&source).unwrap();
    let second = pipeline(500).generate(&source).unwrap();

    assert!(first.report.branch_tasks > 0);
    let first_bits: Vec<u64> = first.grid.values().iter().map(|v| v.to_bits()).collect();
    let second_bits: Vec<u64> = second.grid.values().iter().map(|v| v.to_bits()).collect();
    assert_eq!(first_bits, second_bits);
    assert_eq!(first.image.as_raw(), second.image.as_raw());
}

struct FailingTriangulator;

impl TriangulationProvider for FailingTriangulator {
    fn triangulate(&self, points: &[Point2D]) -> HeatmapResult<TriangleMesh> {
        Err(HeatmapError::InsufficientPoints {
            expected: 3,
            actual: points.len(),
        })
    }
}

#[test]
fn triangulation_errors_abort_the_run() {
    let source = MeasurementSet::new(corner_samples(), 10, 10);
    let result = pipeline(10_000)
        .with_triangulator(Arc::new(FailingTriangulator))
        .generate(&source);
    match result {
        Err(e @ HeatmapError::InsufficientPoints { .. }) => assert!(e.is_precondition()),
        other => panic!("expected triangulation failure, got {:?}", other.map(|p| p.size())),
    }
}

#[test]
fn empty_sample_set_fails_fast() {
    let source = MeasurementSet::new(vec![], 10, 10);
    let result = pipeline(10_000).generate(&source);
    assert!(matches!(result, Err(HeatmapError::EmptySampleSet)));
}

#[test]
fn world_coordinates_project_into_the_grid() {
    let samples = vec![
        Sample::new(0.0, 0.0, 1e-6, 5180.0),
        Sample::new(2.0, 0.0, 2e-6, 5180.0),
        Sample::new(1.0, 1.5, 3e-6, 5180.0),
    ];
    let room = [
        Point2D::new(-0.5, -0.5),
        Point2D::new(2.5, -0.5),
        Point2D::new(2.5, 2.0),
        Point2D::new(-0.5, 2.0),
    ];
    let source = MeasurementSet::from_world(&samples, &room, 10.0).unwrap();
    let product = pipeline(10_000).generate(&source).unwrap();

    assert_eq!(product.size(), (30, 25));
    // Natürliche Koordinate der Messung bei (1.0 m, 1.5 m)
    let value = product.value_at(&Point2D::new(10.0, 15.0)).unwrap();
    assert_relative_eq!(value, 3e-6, max_relative = 1e-9);
}
