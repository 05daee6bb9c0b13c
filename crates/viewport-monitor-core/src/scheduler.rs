// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reconfigurable periodic timer driving the poll loop.
//!
//! One tokio task per timer; the callback runs inline on that task, so ticks
//! never overlap. Rebuilding the timer starts the new period with a zero
//! initial delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::MonitorError;

/// Default poll interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: f64 = 1000.0;

// same horizon tokio uses for "never"; keeps deadline arithmetic in range
const MAX_PERIOD: Duration = Duration::from_secs(86_400 * 365 * 30);

type TickFn = Arc<dyn Fn() + Send + Sync>;

struct Running {
    task: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl Running {
    fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Periodic timer with a reconfigurable interval.
pub struct Scheduler {
    handle: Handle,
    interval_ms: f64,
    callback: Option<TickFn>,
    running: Option<Running>,
    generation: u64,
}

impl Scheduler {
    /// Create a stopped scheduler that will spawn its timer on `handle`.
    pub fn new(handle: Handle, interval_ms: f64) -> Result<Self, MonitorError> {
        validate_interval(interval_ms)?;
        Ok(Self {
            handle,
            interval_ms,
            callback: None,
            running: None,
            generation: 0,
        })
    }

    /// Active interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Number of timers built so far. Increments on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a timer task is currently live.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Install `callback` and start the timer. Replaces any running timer.
    pub fn start<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self.rebuild();
    }

    /// Change the interval.
    ///
    /// Returns `Ok(true)` when a running timer was torn down and rebuilt.
    /// An unchanged interval is a no-op. Invalid intervals leave the current
    /// timer untouched.
    pub fn configure(&mut self, interval_ms: f64) -> Result<bool, MonitorError> {
        validate_interval(interval_ms)?;
        if interval_ms == self.interval_ms {
            return Ok(false);
        }
        self.interval_ms = interval_ms;
        if self.callback.is_none() {
            return Ok(false);
        }
        self.rebuild();
        Ok(true)
    }

    /// Stop the timer and drop the callback. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel();
            debug!(generation = self.generation, "scheduler stopped");
        }
        self.callback = None;
    }

    fn rebuild(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel();
        }
        let Some(callback) = self.callback.clone() else {
            return;
        };
        let Ok(period) = validate_interval(self.interval_ms) else {
            return;
        };
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task = self.handle.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                callback();
            }
        });
        self.running = Some(Running { task, cancelled });
        self.generation += 1;
        debug!(
            interval_ms = self.interval_ms,
            generation = self.generation,
            "scheduler timer built"
        );
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Period for `interval_ms`, or `InvalidInterval` when it is not a positive
/// value that fits in a `Duration`.
fn validate_interval(interval_ms: f64) -> Result<Duration, MonitorError> {
    if !(interval_ms.is_finite() && interval_ms > 0.0) {
        return Err(MonitorError::InvalidInterval(interval_ms));
    }
    let period = Duration::try_from_secs_f64(interval_ms / 1000.0)
        .map_err(|_| MonitorError::InvalidInterval(interval_ms))?;
    // tokio rejects a zero period
    Ok(period.clamp(Duration::from_nanos(1), MAX_PERIOD))
}
