// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory source and sink doubles for headless testing.
//!
//! `RecordingSink` keeps every accepted frame; `ScriptedSource` replays a
//! fixed sequence of samples.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{CameraSource, CameraState, Sink, SinkError};

/// Sink that records frames in memory.
#[derive(Debug)]
pub struct RecordingSink {
    ready: AtomicBool,
    frames: Mutex<Vec<String>>,
    failures: Mutex<VecDeque<SinkError>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(true),
            frames: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }
}

impl RecordingSink {
    /// A ready sink behind an `Arc`, ready to hand to a poll loop.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Toggle readiness.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Make the next `send` fail with `err` (queued, one per call).
    pub fn fail_next(&self, err: SinkError) {
        lock(&self.failures).push_back(err);
    }

    /// Frames accepted so far.
    pub fn frames(&self) -> Vec<String> {
        lock(&self.frames).clone()
    }
}

impl Sink for RecordingSink {
    fn send(&self, text: &str) -> Result<(), SinkError> {
        if let Some(err) = lock(&self.failures).pop_front() {
            return Err(err);
        }
        lock(&self.frames).push(text.to_string());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Source that replays a script of samples, then reports no active view.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Option<CameraState>>,
    taken: usize,
}

impl ScriptedSource {
    /// Build from a sequence of samples (`None` = no active view).
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Option<CameraState>>,
    {
        Self {
            script: script.into_iter().collect(),
            taken: 0,
        }
    }

    /// Append a sample to the script.
    pub fn push(&mut self, sample: Option<CameraState>) {
        self.script.push_back(sample);
    }

    /// How many times `sample` was called.
    pub fn samples_taken(&self) -> usize {
        self.taken
    }
}

impl CameraSource for ScriptedSource {
    fn sample(&mut self) -> Option<CameraState> {
        self.taken += 1;
        self.script.pop_front().flatten()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
