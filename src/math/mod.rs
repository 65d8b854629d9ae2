pub mod error;
pub mod types;
pub mod utils;

// Re-exports für einfache Verwendung
pub use error::{HeatmapError, HeatmapResult};
pub use types::*;
