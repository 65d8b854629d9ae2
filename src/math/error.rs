// src/math/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("No samples available, cannot find nearest one")]
    EmptySampleSet,

    #[error("Insufficient points for operation: expected at least {expected}, got {actual}")]
    InsufficientPoints { expected: usize, actual: usize },

    #[error("Triangulation failed: {reason}")]
    TriangulationFailed { reason: String },

    #[error("Heatmap contains no valid numbers inside the area")]
    NoValidValues,

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Invalid gradient: {message}")]
    InvalidGradient { message: String },

    #[error("Completion barrier interrupted after {waited_ms} ms with {outstanding} outstanding tasks")]
    ConcurrencyTimeout { outstanding: usize, waited_ms: u128 },

    #[error("Worker pool could not be created: {reason}")]
    WorkerPool { reason: String },

    #[error("Config could not be parsed: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

impl HeatmapError {
    /// Fehler, die einen Generierungslauf vor jeder Arbeit beenden.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            HeatmapError::EmptySampleSet
                | HeatmapError::InsufficientPoints { .. }
                | HeatmapError::TriangulationFailed { .. }
                | HeatmapError::NoValidValues
                | HeatmapError::InvalidConfiguration { .. }
                | HeatmapError::InvalidGradient { .. }
        )
    }
}

pub type HeatmapResult<T> = Result<T, HeatmapError>;
