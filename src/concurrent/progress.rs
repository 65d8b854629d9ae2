// src/concurrent/progress.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Empfänger von Fortschrittsmeldungen in Prozent (0 bis 100).
///
/// Meldungen können aus mehreren Threads gleichzeitig und in beliebiger
/// Reihenfolge eintreffen.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, percent: f64) {
        self(percent)
    }
}

/// Verwirft alle Meldungen.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: f64) {}
}

/// Gemeinsamer Pixelzähler mehrerer Worker.
pub struct ProgressCounter {
    done: AtomicU64,
    total: u64,
    sink: Arc<dyn ProgressSink>,
}

impl ProgressCounter {
    pub fn new(total: u64, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            done: AtomicU64::new(0),
            total,
            sink,
        }
    }

    /// Addiert `pixels` und meldet den neuen Gesamtstand.
    pub fn advance(&self, pixels: u64) -> f64 {
        let done = self.done.fetch_add(pixels, Ordering::Relaxed) + pixels;
        let percent = if self.total == 0 {
            100.0
        } else {
            done as f64 / self.total as f64 * 100.0
        };
        trace!("Progress: {:.2}%", percent);
        self.sink.report(percent);
        percent
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
