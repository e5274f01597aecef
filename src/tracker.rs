use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::runtime::{RefreshHandle, RefreshScheduler};

/// Drift-free stopwatch.
///
/// Elapsed time is the accumulated total of finished runs plus the live
/// `now - run_start` delta of the current run, so it never depends on how
/// often (or how late) the host refreshes it. While running, the tracker holds
/// a repeating refresh registration so observers redraw at frame cadence.
pub struct ElapsedTracker<C: Clock> {
    clock: C,
    scheduler: Rc<dyn RefreshScheduler>,
    accumulated: Duration,
    run_start: Option<Instant>,
    refresh: Option<RefreshHandle>,
}

impl<C: Clock> ElapsedTracker<C> {
    pub fn new(clock: C, scheduler: Rc<dyn RefreshScheduler>) -> Self {
        Self {
            clock,
            scheduler,
            accumulated: Duration::ZERO,
            run_start: None,
            refresh: None,
        }
    }

    pub fn play(&mut self) {
        if self.run_start.is_some() {
            return;
        }
        self.run_start = Some(self.clock.now());
        self.refresh = Some(self.scheduler.schedule_repeating());
    }

    pub fn pause(&mut self) {
        let Some(start) = self.run_start.take() else {
            return;
        };
        self.cancel_refresh();
        self.accumulated += self.clock.now().saturating_duration_since(start);
    }

    /// Stop any run and set the accumulated total to `baseline`.
    pub fn reset(&mut self, baseline: Duration) {
        self.cancel_refresh();
        self.run_start = None;
        self.accumulated = baseline;
    }

    /// `reset` with a millisecond baseline; negative or non-finite input is treated as 0.
    pub fn reset_ms(&mut self, baseline_ms: f64) {
        let ms = if baseline_ms.is_finite() && baseline_ms > 0.0 {
            baseline_ms
        } else {
            0.0
        };
        self.reset(Duration::from_secs_f64(ms / 1000.0));
    }

    pub fn is_running(&self) -> bool {
        self.run_start.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.run_start {
            Some(start) => self.accumulated + self.clock.now().saturating_duration_since(start),
            None => self.accumulated,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    fn cancel_refresh(&mut self) {
        if let Some(handle) = self.refresh.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl<C: Clock> Drop for ElapsedTracker<C> {
    fn drop(&mut self) {
        self.cancel_refresh();
    }
}

impl<C: Clock> fmt::Debug for ElapsedTracker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElapsedTracker")
            .field("accumulated", &self.accumulated)
            .field("running", &self.is_running())
            .field("elapsed_seconds", &self.elapsed_seconds())
            .finish()
    }
}
