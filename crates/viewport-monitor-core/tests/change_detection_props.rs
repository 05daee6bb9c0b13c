// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Property tests for the dispatch equality policy.

use proptest::prelude::*;
use viewport_monitor_core::{CameraState, ChangeDetector};

fn coord() -> impl Strategy<Value = f64> {
    -1.0e4f64..1.0e4
}

fn camera() -> impl Strategy<Value = CameraState> {
    (
        "[A-Za-z0-9 ]{0,12}",
        0.0f64..500.0,
        [coord(), coord(), coord()],
        [coord(), coord(), coord()],
        0.1f64..4.0,
    )
        .prop_map(|(name, focal_length, position, target, aspect)| CameraState {
            name,
            focal_length,
            position,
            target,
            aspect,
        })
}

proptest! {
    #[test]
    fn scalar_drift_under_epsilon_never_dispatches(
        prev in camera(),
        d_focal in -0.0009f64..0.0009,
        d_aspect in -0.0009f64..0.0009,
    ) {
        let mut next = prev.clone();
        next.focal_length += d_focal;
        next.aspect += d_aspect;
        prop_assert!(!ChangeDetector::new().should_dispatch(Some(&prev), &next));
    }

    #[test]
    fn any_name_change_dispatches(prev in camera(), suffix in "[ \t]{1,3}|[a-z]{1,3}") {
        let next = prev.clone().with_name(format!("{}{}", prev.name, suffix));
        prop_assert!(ChangeDetector::new().should_dispatch(Some(&prev), &next));
    }

    #[test]
    fn any_vector_component_change_dispatches(
        prev in camera(),
        axis in 0usize..3,
        use_target in any::<bool>(),
        delta in prop_oneof![1.0e-9f64..1.0e-4, -1.0e-4f64..-1.0e-9],
    ) {
        let mut next = prev.clone();
        let v = if use_target { &mut next.target } else { &mut next.position };
        v[axis] += delta;
        prop_assume!(v[axis].to_bits() != if use_target { prev.target[axis] } else { prev.position[axis] }.to_bits());
        prop_assert!(ChangeDetector::new().should_dispatch(Some(&prev), &next));
    }

    #[test]
    fn first_sample_always_dispatches(current in camera()) {
        prop_assert!(ChangeDetector::new().should_dispatch(None, &current));
    }
}
