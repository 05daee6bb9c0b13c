// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Change detection between the last dispatched camera and a fresh sample.
//!
//! Scalars (`focal_length`, `aspect`) tolerate an absolute difference below
//! [`EPSILON`]. Vectors (`position`, `target`) must match bit for bit.

use crate::CameraState;

/// Absolute tolerance for scalar camera fields.
pub const EPSILON: f64 = 0.001;

/// Decides whether a sample differs enough from the last dispatch to send it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangeDetector {
    epsilon: f64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self { epsilon: EPSILON }
    }
}

impl ChangeDetector {
    /// Detector using the standard [`EPSILON`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `current` must be dispatched.
    ///
    /// With no previous state every sample dispatches.
    pub fn should_dispatch(&self, previous: Option<&CameraState>, current: &CameraState) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        !self.same_camera(previous, current)
    }

    fn same_camera(&self, a: &CameraState, b: &CameraState) -> bool {
        a.name == b.name
            && self.scalar_eq(a.focal_length, b.focal_length)
            && vec_eq(&a.position, &b.position)
            && vec_eq(&a.target, &b.target)
            && self.scalar_eq(a.aspect, b.aspect)
    }

    fn scalar_eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.epsilon
    }
}

fn vec_eq(a: &[f64; 3], b: &[f64; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam() -> CameraState {
        CameraState {
            name: "RhinoCamera".into(),
            focal_length: 50.0,
            position: [10.0, -4.0, 3.5],
            target: [0.0, 0.0, 0.0],
            aspect: 1.5,
        }
    }

    #[test]
    fn first_sample_always_dispatches() {
        assert!(ChangeDetector::new().should_dispatch(None, &cam()));
    }

    #[test]
    fn identical_sample_does_not_dispatch() {
        let d = ChangeDetector::new();
        assert!(!d.should_dispatch(Some(&cam()), &cam()));
    }

    #[test]
    fn scalar_drift_below_epsilon_is_ignored() {
        let d = ChangeDetector::new();
        let mut next = cam();
        next.focal_length += 0.0009;
        next.aspect -= 0.0009;
        assert!(!d.should_dispatch(Some(&cam()), &next));
    }

    #[test]
    fn scalar_drift_at_epsilon_dispatches() {
        let d = ChangeDetector::new();
        let mut next = cam();
        next.aspect = cam().aspect + 0.002;
        assert!(d.should_dispatch(Some(&cam()), &next));
    }

    #[test]
    fn tiny_vector_drift_dispatches() {
        let d = ChangeDetector::new();
        let mut next = cam();
        next.target[2] = 1e-9;
        assert!(d.should_dispatch(Some(&cam()), &next));
    }

    #[test]
    fn signed_zero_in_vectors_counts_as_change() {
        let d = ChangeDetector::new();
        let mut next = cam();
        next.target[0] = -0.0;
        assert!(d.should_dispatch(Some(&cam()), &next));
    }

    #[test]
    fn identical_nan_vectors_do_not_dispatch() {
        let d = ChangeDetector::new();
        let mut prev = cam();
        prev.position[1] = f64::NAN;
        let next = prev.clone();
        assert!(!d.should_dispatch(Some(&prev), &next));
    }

    #[test]
    fn whitespace_only_name_change_dispatches() {
        let d = ChangeDetector::new();
        let next = cam().with_name("RhinoCamera ");
        assert!(d.should_dispatch(Some(&cam()), &next));
    }
}
