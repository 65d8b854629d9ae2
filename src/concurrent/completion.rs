// src/concurrent/completion.rs

use crate::math::error::{HeatmapError, HeatmapResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Barriere für eine Anzahl offener Tasks, die während des Wartens wachsen darf.
///
/// Tasks können selbst neue Tasks anmelden (`before_submit`), bevor sie sich
/// abmelden (`task_completed`). Der wartende Aufrufer wird genau dann geweckt,
/// wenn der Zähler auf 0 fällt.
#[derive(Debug, Default)]
pub struct CompletionBarrier {
    outstanding: Mutex<usize>,
    all_done: Condvar,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meldet `count` neue Tasks an. Muss vor dem Einreichen geschehen.
    pub fn before_submit(&self, count: usize) {
        let mut outstanding = self.outstanding.lock();
        *outstanding += count;
        debug!("{} new tasks will be submitted. New task-count: {}", count, *outstanding);
    }

    pub fn task_completed(&self) {
        let mut outstanding = self.outstanding.lock();
        match outstanding.checked_sub(1) {
            Some(remaining) => *outstanding = remaining,
            None => {
                error!("task_completed() called without outstanding tasks");
                return;
            }
        }
        debug!("A task completed. New task-count: {}", *outstanding);
        if *outstanding == 0 {
            debug!("Number of tasks is 0, notifying waiters");
            self.all_done.notify_all();
        }
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.lock()
    }

    /// Blockiert, bis alle angemeldeten Tasks fertig sind.
    pub fn await_completion(&self) {
        let mut outstanding = self.outstanding.lock();
        while *outstanding > 0 {
            self.all_done.wait(&mut outstanding);
        }
        debug!("await_completion() has concluded, all tasks are done");
    }

    /// Wie [`Self::await_completion`], bricht aber nach `timeout` mit
    /// [`HeatmapError::ConcurrencyTimeout`] ab.
    pub fn await_completion_timeout(&self, timeout: Duration) -> HeatmapResult<()> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut outstanding = self.outstanding.lock();
        while *outstanding > 0 {
            if self.all_done.wait_until(&mut outstanding, deadline).timed_out() && *outstanding > 0 {
                return Err(HeatmapError::ConcurrencyTimeout {
                    outstanding: *outstanding,
                    waited_ms: started.elapsed().as_millis(),
                });
            }
        }
        debug!("await_completion_timeout() has concluded, all tasks are done");
        Ok(())
    }
}

/// Meldet einen Task beim Drop ab, auch wenn der Task durch einen Panic endet.
#[derive(Debug)]
pub struct CompletionGuard {
    barrier: Arc<CompletionBarrier>,
}

impl CompletionGuard {
    pub fn new(barrier: Arc<CompletionBarrier>) -> Self {
        Self { barrier }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.barrier.task_completed();
    }
}
