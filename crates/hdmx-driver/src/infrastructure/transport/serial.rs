//! Placeholder serial transport.
//!
//! The switch exposes the same line protocol over RS-232, but no serial
//! backend is wired up yet. Selecting `transport = "serial"` must still fail
//! loudly rather than leave a session silently idle, so this implementation
//! reports a connection failure immediately and then parks until shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Transport, TransportEvent};

/// Transport stub for RS-232 links.
pub struct SerialTransport;

impl SerialTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SerialTransport {
    fn start(self: Arc<Self>) -> mpsc::Receiver<TransportEvent> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            warn!("serial transport selected but not supported");
            let _ = tx
                .send(TransportEvent::ConnectionFailed(
                    "serial connections are not supported".to_string(),
                ))
                .await;
            // Keep the sender alive so the receiver sees a quiet channel
            // instead of a closed one; dropping it would look like shutdown.
            tx.closed().await;
        });
        rx
    }

    async fn send_line(&self, line: &str) {
        debug!("discarding command on unsupported serial transport: {line}");
    }

    fn shutdown(&self) {}
}
