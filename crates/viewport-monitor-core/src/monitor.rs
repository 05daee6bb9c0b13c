// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Monitor facade: a poll loop driven by a scheduler.
//!
//! The host updates sink, label and interval through [`Monitor::reconfigure`]
//! between ticks. Each tick runs under the poll-loop mutex, so a tick always
//! completes before the next begins and swaps never interleave with a send.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tracing::{debug, error, trace, warn};

use crate::poll_loop::{PollLoop, TickOutcome, TickStats, DEFAULT_CAMERA_LABEL};
use crate::scheduler::{Scheduler, DEFAULT_INTERVAL_MS};
use crate::{CameraSource, CameraState, MonitorError, Sink};

/// External parameter surface for a monitor.
#[derive(Clone)]
pub struct MonitorSettings {
    /// Transport; `None` skips every tick.
    pub sink: Option<Arc<dyn Sink>>,
    /// Label copied into every sampled camera's `name`.
    pub camera_label: String,
    /// Poll period in milliseconds.
    pub interval_ms: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sink: None,
            camera_label: DEFAULT_CAMERA_LABEL.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl std::fmt::Debug for MonitorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorSettings")
            .field("sink", &self.sink.as_ref().map(|_| "<sink>"))
            .field("camera_label", &self.camera_label)
            .field("interval_ms", &self.interval_ms)
            .finish()
    }
}

/// Streams camera changes from a source to a sink on a periodic timer.
pub struct Monitor<S> {
    poll: Arc<Mutex<PollLoop<S>>>,
    scheduler: Scheduler,
    shut_down: bool,
}

impl<S> Monitor<S>
where
    S: CameraSource + 'static,
{
    /// Build a stopped monitor. The timer is spawned on `handle` by [`start`](Self::start).
    pub fn new(source: S, settings: MonitorSettings, handle: Handle) -> Result<Self, MonitorError> {
        let scheduler = Scheduler::new(handle, settings.interval_ms)?;
        let mut poll = PollLoop::new(source);
        poll.set_sink(settings.sink);
        poll.set_camera_label(settings.camera_label);
        Ok(Self {
            poll: Arc::new(Mutex::new(poll)),
            scheduler,
            shut_down: false,
        })
    }

    /// Start polling. The first tick fires immediately.
    pub fn start(&mut self) {
        if self.shut_down {
            return;
        }
        let poll = Arc::clone(&self.poll);
        self.scheduler.start(move || run_tick(&poll));
    }

    /// Apply a full set of parameters.
    ///
    /// The timer is rebuilt only if the interval actually changed. The
    /// dispatch baseline is never reset here.
    pub fn reconfigure(&mut self, settings: MonitorSettings) -> Result<(), MonitorError> {
        {
            let mut poll = lock(&self.poll);
            poll.set_sink(settings.sink);
            poll.set_camera_label(settings.camera_label);
        }
        self.set_interval(settings.interval_ms)
    }

    /// Swap the sink.
    pub fn set_sink(&self, sink: Option<Arc<dyn Sink>>) {
        lock(&self.poll).set_sink(sink);
    }

    /// Swap the camera label.
    pub fn set_camera_label(&self, label: impl Into<String>) {
        lock(&self.poll).set_camera_label(label);
    }

    /// Change the poll interval; rebuilds the timer only on a new value.
    pub fn set_interval(&mut self, interval_ms: f64) -> Result<(), MonitorError> {
        if interval_ms == self.scheduler.interval_ms() {
            return Ok(());
        }
        if self.scheduler.configure(interval_ms)? {
            debug!(interval_ms, "monitor interval changed");
        }
        Ok(())
    }

    /// Active interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.scheduler.interval_ms()
    }

    /// Number of timers built so far.
    pub fn timer_generation(&self) -> u64 {
        self.scheduler.generation()
    }

    /// Run one tick synchronously, outside the timer.
    pub fn tick_now(&self) -> Result<TickOutcome, MonitorError> {
        lock(&self.poll).tick()
    }

    /// Last camera successfully dispatched.
    pub fn last_sent(&self) -> Option<CameraState> {
        lock(&self.poll).last_sent().cloned()
    }

    /// Tick counters.
    pub fn stats(&self) -> TickStats {
        lock(&self.poll).stats()
    }

    /// Stop the timer and release the sink and baseline.
    ///
    /// Pending sends are not awaited. Calling this again is a no-op.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.scheduler.stop();
        let mut poll = lock(&self.poll);
        let stats = poll.stats();
        poll.release();
        debug!(
            ticks = stats.ticks,
            dispatched = stats.dispatched,
            failed = stats.failed,
            "monitor shut down"
        );
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl<S> Drop for Monitor<S> {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}

fn run_tick<S: CameraSource>(poll: &Mutex<PollLoop<S>>) {
    let mut poll = lock(poll);
    match poll.tick() {
        Ok(TickOutcome::Dispatched) => {
            if let Some(cam) = poll.last_sent() {
                debug!(
                    name = %cam.name,
                    focal_length = cam.focal_length,
                    position = ?cam.position,
                    target = ?cam.target,
                    "camera dispatched"
                );
            }
        }
        Ok(outcome) => trace!(?outcome, "tick skipped"),
        Err(err @ MonitorError::Encode(_)) => error!(?err, "camera payload could not be encoded"),
        Err(err) => warn!(%err, "camera dispatch failed"),
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
