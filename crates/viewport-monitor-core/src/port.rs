// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ports to the host application and the transport.
//!
//! The poll loop only ever sees these traits; host APIs and socket
//! lifecycles live behind them.

use crate::{CameraState, SinkError};

/// Host-side capability that reads the live viewport camera.
pub trait CameraSource: Send {
    /// Sample the active camera.
    ///
    /// Returns `None` when the host has no active document or view; the
    /// poll loop skips the tick in that case.
    fn sample(&mut self) -> Option<CameraState>;
}

impl<F> CameraSource for F
where
    F: FnMut() -> Option<CameraState> + Send,
{
    fn sample(&mut self) -> Option<CameraState> {
        self()
    }
}

/// Outbound transport endpoint accepting one text frame at a time.
///
/// Connection lifecycle (handshake, reconnects) is owned by the
/// implementation. `send` runs on the timer task and may block it.
pub trait Sink: Send + Sync {
    /// Send a single UTF-8 text frame.
    fn send(&self, text: &str) -> Result<(), SinkError>;
    /// Whether the sink can currently accept frames.
    fn is_ready(&self) -> bool;
}
