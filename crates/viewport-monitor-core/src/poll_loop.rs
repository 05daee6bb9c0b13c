// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One poll cycle: sample, diff against the last dispatch, encode, send.

use std::sync::Arc;

use crate::codec::{encode, Payload};
use crate::{CameraSource, CameraState, ChangeDetector, MonitorError, Sink};

/// Default label stamped onto every sampled camera.
pub const DEFAULT_CAMERA_LABEL: &str = "RhinoCamera";

/// What a single tick did when it completed without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No sink, or the sink reported not ready. Nothing was sampled.
    NotReady,
    /// The host had no active view to sample.
    SourceUnavailable,
    /// The sample matched the last dispatched camera.
    Unchanged,
    /// The sample was sent and became the new baseline.
    Dispatched,
}

/// Running counters for a poll loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks processed.
    pub ticks: u64,
    /// Successful dispatches.
    pub dispatched: u64,
    /// Ticks that ended in an error.
    pub failed: u64,
}

/// The poll → diff → serialize → dispatch state machine.
///
/// Holds the last successfully dispatched camera as the comparison baseline.
/// Only a successful send moves the baseline.
pub struct PollLoop<S> {
    source: S,
    sink: Option<Arc<dyn Sink>>,
    camera_label: String,
    detector: ChangeDetector,
    last_sent: Option<CameraState>,
    stats: TickStats,
}

impl<S> PollLoop<S>
where
    S: CameraSource,
{
    /// Create a loop with no sink and the default camera label.
    pub fn new(source: S) -> Self {
        Self {
            source,
            sink: None,
            camera_label: DEFAULT_CAMERA_LABEL.to_string(),
            detector: ChangeDetector::new(),
            last_sent: None,
            stats: TickStats::default(),
        }
    }

    /// Seed the comparison baseline.
    pub fn with_baseline(mut self, baseline: CameraState) -> Self {
        self.last_sent = Some(baseline);
        self
    }

    /// Replace the sink. `None` makes every tick skip.
    pub fn set_sink(&mut self, sink: Option<Arc<dyn Sink>>) {
        self.sink = sink;
    }

    /// Replace the label copied into each sample's `name`.
    pub fn set_camera_label(&mut self, label: impl Into<String>) {
        self.camera_label = label.into();
    }

    /// Current camera label.
    pub fn camera_label(&self) -> &str {
        &self.camera_label
    }

    /// Last camera that was successfully sent.
    pub fn last_sent(&self) -> Option<&CameraState> {
        self.last_sent.as_ref()
    }

    /// Tick counters.
    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Borrow the camera source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Drop the sink and the baseline.
    pub fn release(&mut self) {
        self.sink = None;
        self.last_sent = None;
    }

    /// Run one poll cycle.
    ///
    /// Send and encode failures are returned; the baseline is left as it was
    /// before the attempt.
    pub fn tick(&mut self) -> Result<TickOutcome, MonitorError> {
        self.stats.ticks += 1;
        let result = self.dispatch();
        match result {
            Ok(TickOutcome::Dispatched) => self.stats.dispatched += 1,
            Err(_) => self.stats.failed += 1,
            Ok(_) => {}
        }
        result
    }

    fn dispatch(&mut self) -> Result<TickOutcome, MonitorError> {
        let Some(sink) = self.sink.as_ref().filter(|s| s.is_ready()).cloned() else {
            return Ok(TickOutcome::NotReady);
        };
        let Some(sample) = self.source.sample() else {
            return Ok(TickOutcome::SourceUnavailable);
        };
        let sample = sample.with_name(self.camera_label.as_str());
        if !self
            .detector
            .should_dispatch(self.last_sent.as_ref(), &sample)
        {
            return Ok(TickOutcome::Unchanged);
        }
        let payload = Payload::camera(sample);
        let text = encode(&payload)?;
        sink.send(&text)?;
        self.last_sent = Some(payload.info);
        Ok(TickOutcome::Dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, ScriptedSource};

    fn cam(x: f64) -> CameraState {
        CameraState {
            name: String::new(),
            focal_length: 50.0,
            position: [x, 0.0, 0.0],
            target: [0.0; 3],
            aspect: 1.5,
        }
    }

    #[test]
    fn not_ready_sink_skips_sampling() {
        let source = ScriptedSource::new([Some(cam(1.0))]);
        let sink = RecordingSink::shared();
        sink.set_ready(false);
        let mut lp = PollLoop::new(source);
        lp.set_sink(Some(sink.clone()));

        assert_eq!(lp.tick().unwrap(), TickOutcome::NotReady);
        assert_eq!(lp.source_mut().samples_taken(), 0);
        assert!(sink.frames().is_empty());
    }

    #[test]
    fn missing_sink_skips() {
        let mut lp = PollLoop::new(ScriptedSource::new([Some(cam(1.0))]));
        assert_eq!(lp.tick().unwrap(), TickOutcome::NotReady);
    }

    #[test]
    fn label_is_stamped_on_the_sample() {
        let sink = RecordingSink::shared();
        let mut lp = PollLoop::new(ScriptedSource::new([Some(cam(1.0).with_name("host"))]));
        lp.set_sink(Some(sink.clone()));
        lp.set_camera_label("Viewport");

        lp.tick().unwrap();
        assert_eq!(lp.last_sent().map(|c| c.name.as_str()), Some("Viewport"));
        assert!(sink.frames()[0].contains(r#""name":"Viewport""#));
    }

    #[test]
    fn stats_track_outcomes() {
        let sink = RecordingSink::shared();
        let mut lp = PollLoop::new(ScriptedSource::new([
            Some(cam(1.0)),
            Some(cam(1.0)),
            None,
            Some(cam(2.0)),
        ]));
        lp.set_sink(Some(sink.clone()));
        for _ in 0..3 {
            lp.tick().unwrap();
        }
        sink.fail_next(crate::SinkError::Closed);
        assert!(lp.tick().is_err());

        assert_eq!(
            lp.stats(),
            TickStats {
                ticks: 4,
                dispatched: 1,
                failed: 1
            }
        );
    }
}
