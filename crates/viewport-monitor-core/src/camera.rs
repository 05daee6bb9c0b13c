// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera snapshot type sampled from the host viewport.

use serde::{Deserialize, Serialize};

/// Immutable snapshot of the observable attributes of a viewport camera.
///
/// Units for `position` and `target` are whatever the host uses; the monitor
/// never interprets them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    /// Free-form label identifying the camera on the consumer side.
    pub name: String,
    /// 35mm-equivalent lens length.
    pub focal_length: f64,
    /// Camera location.
    pub position: [f64; 3],
    /// Look-at target.
    pub target: [f64; 3],
    /// Frustum aspect ratio (width / height).
    pub aspect: f64,
}

impl CameraState {
    /// Replace the label, keeping every sampled value.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
