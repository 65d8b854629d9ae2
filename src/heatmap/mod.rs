// src/heatmap/mod.rs

pub mod barycentric;
pub mod boundary;
pub mod color;
pub mod config;
pub mod engine;
pub mod gradient;
pub mod grid;
pub mod layout;
pub mod locator;
pub mod pipeline;
pub mod polygon;
pub mod render;
pub mod sample;
pub mod triangulation;

// Re-exports für einfache Verwendung
pub use boundary::{BoundarySynthesizer, ExternalPointStrategy};
pub use color::{ColorMode, ColorSelector, ValueBounds};
pub use config::HeatmapConfig;
pub use engine::{EngineSettings, InterpolationEngine};
pub use gradient::{GradientColors, GradientWidth};
pub use grid::ScalarGrid;
pub use layout::GridLayout;
pub use pipeline::{
    GenerationCallback, GenerationReport, HeatmapPipeline, HeatmapProduct, MeasurementSet, SampleSource,
};
pub use polygon::AreaPolygon;
pub use sample::{RssiAggregate, Sample};
pub use triangulation::{SpadeTriangulator, Triangle, TriangleMesh, TriangulationProvider};
