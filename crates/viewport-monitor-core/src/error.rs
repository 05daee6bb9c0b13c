// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types surfaced by the poll loop and its transports.

use thiserror::Error;

/// Errors a [`Sink`](crate::Sink) may report from `send`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// No connection is currently open.
    #[error("sink not connected")]
    NotConnected,
    /// The outbound queue is full; the frame was dropped.
    #[error("sink queue full")]
    QueueFull,
    /// The sink was closed and will not accept more frames.
    #[error("sink closed")]
    Closed,
    /// Transport-specific failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by a monitor tick or reconfiguration.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A payload could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
    /// A text frame could not be parsed.
    #[error("decode error: {0}")]
    Decode(String),
    /// A frame carried an action other than `camera`.
    #[error("unexpected action: {0}")]
    UnexpectedAction(String),
    /// The sink rejected a frame.
    #[error("send failed: {0}")]
    Send(#[from] SinkError),
    /// Timer interval must be finite and positive.
    #[error("invalid interval: {0} ms")]
    InvalidInterval(f64),
}
