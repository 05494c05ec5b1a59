// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! WebSocket event subscription with linear reconnect back-off.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::RunnerError;
use crate::events::AgentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Reconnects attempted after a drop before giving up.
    pub reconnect_attempts: u32,
    /// Delay unit; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
    /// Capacity of the event channel.
    pub buffer: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            reconnect_attempts: 5,
            backoff: Duration::from_secs(1),
            buffer: 256,
        }
    }
}

/// Whether the event stream currently has a live connection.
///
/// Reads `false` for good once the stream gives up reconnecting.
#[derive(Debug, Clone)]
pub struct StreamStatus(watch::Receiver<bool>);

impl StreamStatus {
    /// A status that is connected and never changes.
    pub fn connected() -> Self {
        let (_, rx) = watch::channel(true);
        Self(rx)
    }

    pub fn is_connected(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait for a live connection. Returns `false` if the stream gave up first.
    pub async fn wait_connected(&mut self) -> bool {
        loop {
            if *self.0.borrow_and_update() {
                return true;
            }
            if self.0.changed().await.is_err() {
                return *self.0.borrow();
            }
        }
    }
}

impl From<watch::Receiver<bool>> for StreamStatus {
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self(rx)
    }
}

/// The receiving end of a runner subscription.
#[derive(Debug)]
pub struct EventSubscription {
    pub events: mpsc::Receiver<AgentEvent>,
    pub status: StreamStatus,
}

impl EventSubscription {
    /// A subscription over an already-open channel.
    pub fn ready(events: mpsc::Receiver<AgentEvent>) -> Self {
        Self {
            events,
            status: StreamStatus::connected(),
        }
    }
}

/// `http://host` becomes `ws://host/ws`, `https://host` becomes `wss://host/ws`.
pub fn websocket_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{ws}/ws")
}

/// Parse a text frame, logging and skipping anything that is not an event.
pub fn parse_frame(text: &str) -> Option<AgentEvent> {
    match AgentEvent::from_json(text) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "Skipping unparseable event frame");
            None
        }
    }
}

/// Connect to `url` in a background task and forward events to the returned channel.
///
/// Frames sent before the handshake completes are never delivered, so callers
/// should wait on the status before dispatching.
///
/// The task ends when the receiver is dropped or reconnects are exhausted.
pub fn spawn_event_stream(url: String, options: StreamOptions) -> EventSubscription {
    let (tx, events) = mpsc::channel(options.buffer.max(1));
    let (connected, status) = watch::channel(false);
    tokio::spawn(run_stream(url, options, tx, connected));
    EventSubscription {
        events,
        status: StreamStatus(status),
    }
}

async fn run_stream(
    url: String,
    options: StreamOptions,
    tx: mpsc::Sender<AgentEvent>,
    connected: watch::Sender<bool>,
) {
    let mut attempts: u32 = 0;

    loop {
        match connect_async(url.as_str()).await {
            Ok((mut socket, _)) => {
                info!(%url, "Connected to runner event stream");
                attempts = 0;
                connected.send_replace(true);

                while let Some(frame) = socket.next().await {
                    match frame {
                        Ok(Message::Text(text)) => {
                            let Some(event) = parse_frame(&text) else {
                                continue;
                            };
                            if tx.send(event).await.is_err() {
                                debug!("Event receiver dropped, closing stream");
                                return;
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            let err = RunnerError::Stream(e.to_string());
                            warn!(error = %err, retryable = err.is_retryable(), "Runner event stream failed");
                            break;
                        }
                    }
                }
                connected.send_replace(false);
                warn!(%url, "Runner event stream disconnected");
            }
            Err(e) => warn!(%url, error = %e, "Failed to connect to runner event stream"),
        }

        if tx.is_closed() {
            return;
        }
        attempts += 1;
        if attempts > options.reconnect_attempts {
            error!(%url, attempts = options.reconnect_attempts, "Giving up on runner event stream");
            return;
        }
        let delay = options.backoff * attempts;
        info!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Reconnecting to runner event stream");
        tokio::time::sleep(delay).await;
    }
}
