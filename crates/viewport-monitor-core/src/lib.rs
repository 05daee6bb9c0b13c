// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewport camera monitor.
//!
//! Polls a host camera on a timer, detects meaningful changes, and pushes
//! each change as a JSON text frame to an outbound sink.
//!
//! # Flow per tick
//!
//! - sink absent or not ready → skip
//! - no active view → skip
//! - unchanged since the last dispatch → skip
//! - otherwise encode, send, and (on success) adopt the sample as the new baseline
//!
//! Host and transport are reached only through [`CameraSource`] and [`Sink`].

pub mod codec;
pub mod config;
pub mod scheduler;
pub mod testing;

mod camera;
mod detector;
mod error;
mod monitor;
mod poll_loop;
mod port;

pub use camera::CameraState;
pub use codec::{Payload, CAMERA_ACTION};
pub use detector::{ChangeDetector, EPSILON};
pub use error::{MonitorError, SinkError};
pub use monitor::{Monitor, MonitorSettings};
pub use poll_loop::{PollLoop, TickOutcome, TickStats, DEFAULT_CAMERA_LABEL};
pub use port::{CameraSource, Sink};
pub use scheduler::{Scheduler, DEFAULT_INTERVAL_MS};
