// src/concurrent/mod.rs

pub mod completion;
pub mod progress;

pub use completion::{CompletionBarrier, CompletionGuard};
pub use progress::{NoProgress, ProgressCounter, ProgressSink};
