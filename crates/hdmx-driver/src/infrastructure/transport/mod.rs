//! Transport capability: maintaining one live line-oriented link to the
//! switch and shuttling raw text across it.
//!
//! Two implementations exist, selected by [`TransportKind`] when the session
//! is constructed:
//! - [`telnet::TelnetTransport`] — a raw TCP connection with automatic
//!   reconnection (the only transport that actually works today);
//! - [`serial::SerialTransport`] — a placeholder that reports
//!   "not supported" so a serial configuration fails loudly instead of
//!   silently doing nothing.

pub mod serial;
pub mod telnet;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::{SessionConfig, TransportKind};
use serial::SerialTransport;
use telnet::{TelnetConfig, TelnetTransport};

/// Events emitted by a transport to the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A link to the switch was established.
    Connected,
    /// A connection attempt failed; the transport keeps retrying.
    ConnectionFailed(String),
    /// An established link was lost; the transport reconnects on its own.
    Disconnected,
    /// One non-blank line received from the switch, in receive order.
    Line(String),
}

/// Capability interface for a switch link.
///
/// Implementations own the link exclusively: the socket, its streams, and
/// the connected flag are never touched from outside. Callers interact only
/// through the event stream and `send_line`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Spawns the connection management task and returns the event stream.
    ///
    /// Must be called from within a Tokio runtime. The first connection
    /// attempt starts immediately.
    fn start(self: Arc<Self>) -> mpsc::Receiver<TransportEvent>;

    /// Writes one line (terminator appended by the transport) and flushes.
    ///
    /// A send with no live connection is a logged no-op, never an error:
    /// command sends are fire-and-forget by design.
    async fn send_line(&self, line: &str);

    /// Tears the link down. Idempotent, callable from any task, and
    /// guaranteed to unblock an in-flight read.
    fn shutdown(&self);
}

/// Builds the transport selected by the session configuration.
pub fn create_transport(config: &SessionConfig) -> Arc<dyn Transport> {
    match config.transport {
        TransportKind::Telnet => Arc::new(TelnetTransport::new(TelnetConfig {
            hostname: config.hostname.clone(),
            port: config.port,
            ..TelnetConfig::default()
        })),
        TransportKind::Serial => Arc::new(SerialTransport::new()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
