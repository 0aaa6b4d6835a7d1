//! Raw-TCP transport to the switch's telnet interface.
//!
//! Deliberately NOT a telnet-protocol client: real telnet clients emit
//! option-negotiation control bytes after writes, which the switch does not
//! tolerate and which leave the connection unresponsive. The device speaks
//! plain lines over a plain socket.
//!
//! One background task owns the socket for its whole lifetime. It loops
//! through connect → read → disconnect, reconnecting with a fixed delay
//! (the first attempt has no delay). Command sends come in from other tasks
//! through [`TelnetTransport::send_line`] and go out through the write half
//! of the current connection generation; once a generation is torn down the
//! write half is gone and stale sends turn into logged no-ops.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time;
use tracing::{debug, info, trace, warn};

use super::{Transport, TransportEvent};

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Connection parameters for the telnet transport.
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    /// Hostname or IP address of the switch.
    pub hostname: String,
    /// TCP port of the telnet interface.
    pub port: u16,
    /// Delay between reconnection attempts.
    pub reconnect_delay: Duration,
    /// Socket read timeout; on expiry a probe byte checks for a half-open
    /// connection instead of treating the silence as an error.
    pub read_timeout: Duration,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 23,
            reconnect_delay: Duration::from_secs(60),
            read_timeout: Duration::from_secs(60),
        }
    }
}

/// Manages the single live TCP connection to the switch.
pub struct TelnetTransport {
    config: TelnetConfig,
    /// Write half of the current connection generation; `None` whenever no
    /// connection is live. Replaced wholesale on every reconnect.
    write_half: Mutex<Option<OwnedWriteHalf>>,
    running: AtomicBool,
    shutdown_signal: Notify,
    generation: AtomicU64,
}

impl TelnetTransport {
    /// Creates a new (not yet connected) transport.
    pub fn new(config: TelnetConfig) -> Self {
        Self {
            config,
            write_half: Mutex::new(None),
            running: AtomicBool::new(true),
            shutdown_signal: Notify::new(),
            generation: AtomicU64::new(0),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Resolves the endpoint and opens a keep-alive TCP connection.
    async fn open_socket(&self) -> io::Result<TcpStream> {
        let addr = lookup_host((self.config.hostname.as_str(), self.config.port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address found for {}", self.config.hostname),
                )
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        // Keep-alive so the OS notices a silently vanished peer eventually;
        // the read-timeout probe catches it much sooner.
        socket.set_keepalive(true)?;
        socket.connect(addr).await
    }

    /// Runs connect → read → disconnect until shutdown.
    async fn run(self: Arc<Self>, tx: mpsc::Sender<TransportEvent>) {
        debug!("starting transport task for {}:{}", self.config.hostname, self.config.port);

        // The very first attempt connects without waiting.
        let mut delay = Duration::ZERO;
        while self.is_running() {
            if !delay.is_zero() {
                tokio::select! {
                    _ = self.shutdown_signal.notified() => break,
                    _ = time::sleep(delay) => {}
                }
                if !self.is_running() {
                    break;
                }
            }
            delay = self.config.reconnect_delay;

            match self.open_socket().await {
                Ok(stream) => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(
                        generation,
                        "connected to {}:{}", self.config.hostname, self.config.port
                    );

                    let (read_half, write_half) = stream.into_split();
                    // The write half must be in place before Connected is
                    // announced so the login handshake can send right away.
                    {
                        let mut guard = self.write_half.lock().await;
                        *guard = Some(write_half);
                    }
                    if tx.send(TransportEvent::Connected).await.is_err() {
                        break;
                    }

                    self.read_loop(read_half, &tx).await;

                    {
                        let mut guard = self.write_half.lock().await;
                        *guard = None;
                    }
                    if self.is_running() {
                        if tx.send(TransportEvent::Disconnected).await.is_err() {
                            break;
                        }
                        info!("disconnected; reconnecting in {:?}", delay);
                    }
                }
                Err(e) => {
                    if self.is_running() {
                        warn!(
                            "could not connect to {}:{}: {e}",
                            self.config.hostname, self.config.port
                        );
                        let message = format!(
                            "error connecting to {}:{}: {e}",
                            self.config.hostname, self.config.port
                        );
                        if tx.send(TransportEvent::ConnectionFailed(message)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        let mut guard = self.write_half.lock().await;
        *guard = None;
        debug!("transport task stopped");
    }

    /// Reads until EOF, an I/O error, or shutdown. Lines (split on `\r` or
    /// `\n`) are forwarded in receive order; blank lines are dropped.
    async fn read_loop(&self, mut reader: OwnedReadHalf, tx: &mpsc::Sender<TransportEvent>) {
        let mut pending: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let read = tokio::select! {
                _ = self.shutdown_signal.notified() => return,
                r = time::timeout(self.config.read_timeout, reader.read(&mut chunk)) => r,
            };

            match read {
                // Read timeout: the switch is just quiet. Half-open
                // connections are not detected unless we write, so send a
                // lone carriage return as a probe.
                Err(_elapsed) => {
                    trace!("socket read timeout, probing connection");
                    if !self.probe().await {
                        debug!("probe write failed, treating connection as dead");
                        return;
                    }
                }
                // EOF: peer closed the connection.
                Ok(Ok(0)) => {
                    debug!("no more data from the switch, disconnecting");
                    return;
                }
                Ok(Ok(n)) => {
                    pending.extend_from_slice(&chunk[..n]);
                    for line in drain_lines(&mut pending) {
                        if line.trim().is_empty() {
                            continue;
                        }
                        trace!("received from {}: {line}", self.config.hostname);
                        if tx.send(TransportEvent::Line(line)).await.is_err() {
                            return;
                        }
                    }
                }
                Ok(Err(e)) => {
                    // Shutdown closes the socket under us; don't log that
                    // as a connection error.
                    if self.is_running() {
                        debug!("error on telnet connection: {e}");
                    }
                    return;
                }
            }
        }
    }

    /// Writes a single `\r` to detect half-open connections. Returns false
    /// when the connection is dead.
    async fn probe(&self) -> bool {
        let mut guard = self.write_half.lock().await;
        let Some(writer) = guard.as_mut() else {
            return false;
        };
        match writer.write_all(b"\r").await {
            Ok(()) => writer.flush().await.is_ok(),
            Err(e) => {
                debug!("error writing probe to socket: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl Transport for TelnetTransport {
    fn start(self: Arc<Self>) -> mpsc::Receiver<TransportEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(Arc::clone(&self).run(tx));
        rx
    }

    async fn send_line(&self, line: &str) {
        let mut guard = self.write_half.lock().await;
        match guard.as_mut() {
            Some(writer) => {
                let mut buf = Vec::with_capacity(line.len() + 1);
                buf.extend_from_slice(line.as_bytes());
                buf.push(b'\r');
                if let Err(e) = writer.write_all(&buf).await {
                    debug!("error sending command: {e}");
                } else if let Err(e) = writer.flush().await {
                    debug!("error flushing command: {e}");
                }
            }
            None => debug!("cannot send command, no live telnet connection"),
        }
    }

    fn shutdown(&self) {
        if self.running.swap(false, Ordering::Relaxed) {
            debug!("shutting down telnet transport");
            // Wakes whichever of the read select or the reconnect sleep is
            // currently parked; the permit is stored if neither is yet.
            self.shutdown_signal.notify_one();
        }
    }
}

/// Splits complete lines off the front of `buf`, leaving any trailing
/// partial line in place. Both `\r` and `\n` terminate a line, so `\r\n`
/// yields one line plus one blank that callers drop.
fn drain_lines(buf: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buf.iter().position(|&b| b == b'\r' || b == b'\n') {
        let raw: Vec<u8> = buf.drain(..=pos).collect();
        lines.push(String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned());
    }
    lines
}

// ── Tests ─────────────────────────────────────────────────────────────────────
