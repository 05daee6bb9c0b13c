// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON wire envelope for camera updates.
//!
//! One text frame per dispatched change:
//!
//! ```json
//! {"action":"camera","info":{"name":"RhinoCamera","focalLength":50.0,
//!  "position":[0.0,0.0,5.0],"target":[0.0,0.0,0.0],"aspect":1.5}}
//! ```

use serde::{Deserialize, Serialize};

use crate::{CameraState, MonitorError};

/// Value of the `action` field for camera updates.
pub const CAMERA_ACTION: &str = "camera";

/// Message envelope sent to the consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Message kind; always [`CAMERA_ACTION`] for payloads built here.
    pub action: String,
    /// Camera snapshot.
    pub info: CameraState,
}

impl Payload {
    /// Wrap a camera snapshot in a `camera` envelope.
    pub fn camera(info: CameraState) -> Self {
        Self {
            action: CAMERA_ACTION.to_string(),
            info,
        }
    }
}

/// Encode a payload as a UTF-8 JSON text frame.
///
/// Field order follows declaration order, so equal payloads encode to equal
/// strings.
pub fn encode(payload: &Payload) -> Result<String, MonitorError> {
    serde_json::to_string(payload).map_err(MonitorError::Encode)
}

/// Decode a text frame produced by [`encode`].
pub fn decode(text: &str) -> Result<Payload, MonitorError> {
    let payload: Payload =
        serde_json::from_str(text).map_err(|e| MonitorError::Decode(e.to_string()))?;
    if payload.action != CAMERA_ACTION {
        return Err(MonitorError::UnexpectedAction(payload.action));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample() -> CameraState {
        CameraState {
            name: "Cam1".into(),
            focal_length: 35.0,
            position: [1.0, 2.0, 3.0],
            target: [0.0, 0.0, 0.0],
            aspect: 1.78,
        }
    }

    #[test]
    fn encodes_fixed_schema_without_extra_fields() {
        let text = encode(&Payload::camera(sample())).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "camera",
                "info": {
                    "name": "Cam1",
                    "focalLength": 35.0,
                    "position": [1.0, 2.0, 3.0],
                    "target": [0.0, 0.0, 0.0],
                    "aspect": 1.78
                }
            })
        );
    }

    #[test]
    fn encoding_is_stable() {
        let a = encode(&Payload::camera(sample())).unwrap();
        let b = encode(&Payload::camera(sample())).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(r#"{"action":"camera","info":{"name":"Cam1","focalLength":35.0"#));
    }

    #[test]
    fn decode_rejects_foreign_actions() {
        let text = r#"{"action":"light","info":{"name":"","focalLength":0,"position":[0,0,0],"target":[0,0,0],"aspect":0}}"#;
        match decode(text) {
            Err(MonitorError::UnexpectedAction(a)) => assert_eq!(a, "light"),
            other => panic!("expected UnexpectedAction, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_short_vectors() {
        let text = r#"{"action":"camera","info":{"name":"","focalLength":0,"position":[0,0],"target":[0,0,0],"aspect":0}}"#;
        assert!(matches!(decode(text), Err(MonitorError::Decode(_))));
    }
}
