// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! WebSocket client [`Sink`] for the viewport monitor.
//!
//! A background task owns the connection: it connects, forwards queued text
//! frames, and reconnects after a delay when the peer goes away. `send` only
//! pushes onto a bounded queue, so the poll loop never waits on the network.
//! A frame that was accepted but never written is reported as
//! [`SinkError::Transport`] by the next `send`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use viewport_monitor_core::{Sink, SinkError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Last delivery failure not yet reported to a caller.
#[derive(Clone, Default)]
struct PendingFailure(Arc<Mutex<Option<String>>>);

impl PendingFailure {
    fn record(&self, reason: String) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
    }

    fn take(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Tuning knobs for [`WsSink`].
#[derive(Clone, Debug)]
pub struct WsSinkOptions {
    /// Frames that may wait for the writer before `send` reports `QueueFull`.
    pub queue_depth: usize,
    /// Pause between a disconnect (or failed connect) and the next attempt.
    pub reconnect_delay: Duration,
    /// Upper bound on a single connect + handshake.
    pub connect_timeout: Duration,
}

impl Default for WsSinkOptions {
    fn default() -> Self {
        Self {
            queue_depth: 16,
            reconnect_delay: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Outbound WebSocket connection that accepts camera frames as text messages.
///
/// `send` returning `Ok` means the frame was queued, not written. When the
/// writer later fails, or drops queued frames because the connection went
/// away, the reason is held and returned once as `SinkError::Transport` from
/// the following `send`; that following frame is not queued.
pub struct WsSink {
    url: String,
    tx: mpsc::Sender<String>,
    connected: Arc<AtomicBool>,
    failure: PendingFailure,
    closed: AtomicBool,
    task: JoinHandle<()>,
}

impl WsSink {
    /// Spawn the connection task on `handle` and return immediately.
    ///
    /// The sink reports not ready until the first handshake completes.
    pub fn spawn(url: impl Into<String>, options: WsSinkOptions, handle: &Handle) -> Self {
        let url = url.into();
        let (tx, rx) = mpsc::channel(options.queue_depth.max(1));
        let connected = Arc::new(AtomicBool::new(false));
        let failure = PendingFailure::default();
        let task = handle.spawn(run_connection(
            url.clone(),
            options,
            rx,
            Arc::clone(&connected),
            failure.clone(),
        ));
        Self {
            url,
            tx,
            connected,
            failure,
            closed: AtomicBool::new(false),
            task,
        }
    }

    /// Consumer URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Stop the connection task. Queued frames are dropped.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.connected.store(false, Ordering::SeqCst);
        self.task.abort();
        debug!(url = %self.url, "ws sink closed");
    }
}

impl Drop for WsSink {
    fn drop(&mut self) {
        self.close();
    }
}

impl Sink for WsSink {
    fn send(&self, text: &str) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        if let Some(reason) = self.failure.take() {
            return Err(SinkError::Transport(reason));
        }
        if !self.is_connected() {
            return Err(SinkError::NotConnected);
        }
        match self.tx.try_send(text.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SinkError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(SinkError::Closed),
        }
    }

    fn is_ready(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.is_connected()
    }
}

enum PumpEnd {
    QueueClosed,
    Disconnected(String),
}

async fn run_connection(
    url: String,
    options: WsSinkOptions,
    mut rx: mpsc::Receiver<String>,
    connected: Arc<AtomicBool>,
    failure: PendingFailure,
) {
    loop {
        match time::timeout(options.connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((ws, _response))) => {
                info!(url = %url, "ws sink connected");
                connected.store(true, Ordering::SeqCst);
                let end = pump(ws, &mut rx, &failure).await;
                connected.store(false, Ordering::SeqCst);
                // frames queued for a dead connection are stale
                let mut dropped = 0usize;
                while rx.try_recv().is_ok() {
                    dropped += 1;
                }
                match end {
                    PumpEnd::QueueClosed => return,
                    PumpEnd::Disconnected(reason) => {
                        warn!(url = %url, reason = %reason, dropped, "ws sink disconnected");
                        if dropped > 0 {
                            failure.record(format!("{reason}; {dropped} queued frame(s) dropped"));
                        }
                    }
                }
            }
            Ok(Err(err)) => warn!(url = %url, %err, "ws sink connect failed"),
            Err(_) => warn!(url = %url, "ws sink connect timed out"),
        }
        time::sleep(options.reconnect_delay).await;
    }
}

async fn pump(
    ws: WsStream,
    rx: &mut mpsc::Receiver<String>,
    failure: &PendingFailure,
) -> PumpEnd {
    let (mut ws_tx, mut ws_rx) = ws.split();
    loop {
        tokio::select! {
            out = rx.recv() => match out {
                Some(text) => {
                    if let Err(err) = ws_tx.send(Message::Text(text.into())).await {
                        failure.record(format!("write failed: {err}"));
                        return PumpEnd::Disconnected(err.to_string());
                    }
                }
                None => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return PumpEnd::QueueClosed;
                }
            },
            inbound = ws_rx.next() => match inbound {
                // tungstenite queues pongs itself; nothing else is expected back
                Some(Ok(Message::Close(_))) | None => {
                    return PumpEnd::Disconnected("closed by peer".into());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return PumpEnd::Disconnected(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_failure_is_reported_once_by_next_send() {
        // nothing listens on port 9 in the test environment
        let sink = WsSink::spawn("ws://127.0.0.1:9", WsSinkOptions::default(), &Handle::current());
        sink.failure.record("write failed: broken pipe".into());

        assert_eq!(
            sink.send("{}"),
            Err(SinkError::Transport("write failed: broken pipe".into()))
        );
        assert_eq!(sink.send("{}"), Err(SinkError::NotConnected));
        sink.close();
    }

    #[tokio::test]
    async fn queued_frame_is_accepted_without_failure() {
        let sink = WsSink::spawn("ws://127.0.0.1:9", WsSinkOptions::default(), &Handle::current());
        sink.connected.store(true, Ordering::SeqCst);
        assert_eq!(sink.send("{}"), Ok(()));

        sink.failure.record("closed by peer; 1 queued frame(s) dropped".into());
        assert!(matches!(sink.send("{}"), Err(SinkError::Transport(_))));
        assert_eq!(sink.send("{}"), Ok(()));
        sink.close();
    }
}
