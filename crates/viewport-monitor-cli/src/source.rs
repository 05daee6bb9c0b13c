// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera sources available from the command line.

use std::fs;
use std::path::PathBuf;

use tracing::debug;
use viewport_monitor_core::{CameraSource, CameraState};

/// Reads the live camera from a JSON file the host rewrites.
///
/// A missing or half-written file means "no active view" for that tick.
pub struct FileCameraSource {
    path: PathBuf,
}

impl FileCameraSource {
    /// Source reading `path` afresh on every sample.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CameraSource for FileCameraSource {
    fn sample(&mut self) -> Option<CameraState> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "camera file unavailable");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(cam) => Some(cam),
            Err(err) => {
                debug!(path = %self.path.display(), %err, "camera file unreadable");
                None
            }
        }
    }
}

/// Circles the origin at a fixed radius; one step per sample.
pub struct OrbitSource {
    radius: f64,
    step_radians: f64,
    angle: f64,
}

impl OrbitSource {
    /// Orbit of `radius` around the origin, advancing `step_degrees` per sample.
    pub fn new(radius: f64, step_degrees: f64) -> Self {
        Self {
            radius,
            step_radians: step_degrees.to_radians(),
            angle: 0.0,
        }
    }
}

impl CameraSource for OrbitSource {
    fn sample(&mut self) -> Option<CameraState> {
        let (sin, cos) = self.angle.sin_cos();
        self.angle = (self.angle + self.step_radians) % std::f64::consts::TAU;
        Some(CameraState {
            name: String::new(),
            focal_length: 50.0,
            position: [self.radius * cos, self.radius * sin, self.radius * 0.5],
            target: [0.0; 3],
            aspect: 16.0 / 9.0,
        })
    }
}
