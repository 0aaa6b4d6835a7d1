//! Session orchestrator: keeps exactly one connector alive towards a
//! configured switch, rebuilding it after failures.
//!
//! Lifecycle per connection attempt: build a connector, consume its events,
//! and on any connection error dispose it (connector, transport, and poll
//! task together) and schedule a fresh one 30 seconds later. Availability
//! is published on a `watch` channel so any number of observers can follow
//! `Unknown` → `Online` → `Offline` transitions without consuming events
//! meant for the sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hdmx_core::ZoneState;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use super::connector::{CommandError, Connector, ConnectorEvent};
use crate::config::{ConfigError, SessionConfig};

/// Delay before a failed connection attempt is retried with a fresh
/// connector. Distinct from the transport's own reconnect delay: a session
/// retry rebuilds the whole connector rather than reusing it.
const SESSION_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Availability of the switch as seen by this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No connection attempt has concluded yet.
    Unknown,
    /// Logged in; zone state updates are flowing.
    Online,
    /// Not reachable or not logged in; retrying. Carries the reason from
    /// the first error of the current outage.
    Offline(String),
}

/// Receiver of zone state updates.
///
/// Every accepted status line becomes one call, including exact repeats:
/// the session does no deduplication or diffing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneStateSink: Send + Sync {
    async fn zone_state_updated(&self, state: ZoneState);
}

/// Drives connectors towards one switch endpoint for as long as it lives.
pub struct Session {
    config: SessionConfig,
    sink: Arc<dyn ZoneStateSink>,
    status_tx: watch::Sender<SessionStatus>,
    connector: Mutex<Option<Arc<Connector>>>,
    running: AtomicBool,
    shutdown_signal: Notify,
}

impl Session {
    /// Validates the configuration and starts the session.
    ///
    /// Fails fast on configuration errors; transient connection problems
    /// are never surfaced here, only through [`Session::status`].
    pub fn start(
        config: SessionConfig,
        sink: Arc<dyn ZoneStateSink>,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;

        let (status_tx, _) = watch::channel(SessionStatus::Unknown);
        let session = Arc::new(Self {
            config,
            sink,
            status_tx,
            connector: Mutex::new(None),
            running: AtomicBool::new(true),
            shutdown_signal: Notify::new(),
        });
        tokio::spawn(Arc::clone(&session).run());
        Ok(session)
    }

    /// Subscribes to availability transitions. The current value is
    /// observable immediately.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Stops the session. Idempotent and callable from any task; the
    /// current connector is disposed and no new one is built.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::Relaxed) {
            debug!("shutting down session for {}", self.config.hostname);
            self.shutdown_signal.notify_one();
        }
    }

    // ── Command passthroughs ──────────────────────────────────────────────────
    //
    // Validation errors from the connector propagate; commands while no
    // connector is live are logged no-ops, matching the fire-and-forget
    // nature of the wire protocol.

    pub async fn switch_input(&self, input: u8, zone: u8) -> Result<(), CommandError> {
        match self.live_connector().await {
            Some(c) => c.switch_input(input, zone).await,
            None => Ok(()),
        }
    }

    pub async fn set_mute(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        match self.live_connector().await {
            Some(c) => c.set_mute(zone, on).await,
            None => Ok(()),
        }
    }

    pub async fn set_audio(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        match self.live_connector().await {
            Some(c) => c.set_audio(zone, on).await,
            None => Ok(()),
        }
    }

    pub async fn set_video(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        match self.live_connector().await {
            Some(c) => c.set_video(zone, on).await,
            None => Ok(()),
        }
    }

    pub async fn set_cec(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        match self.live_connector().await {
            Some(c) => c.set_cec(zone, on).await,
            None => Ok(()),
        }
    }

    pub async fn save_profile(&self, number: u8) -> Result<(), CommandError> {
        match self.live_connector().await {
            Some(c) => c.save_profile(number).await,
            None => Ok(()),
        }
    }

    pub async fn load_profile(&self, number: u8) -> Result<(), CommandError> {
        match self.live_connector().await {
            Some(c) => c.load_profile(number).await,
            None => Ok(()),
        }
    }

    /// Asks the switch for a full status report outside the poll schedule.
    pub async fn read_status(&self) {
        if let Some(c) = self.live_connector().await {
            c.read_status().await;
        }
    }

    async fn live_connector(&self) -> Option<Arc<Connector>> {
        let guard = self.connector.lock().await;
        if guard.is_none() {
            warn!("no live connection to the switch, dropping command");
        }
        guard.clone()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    async fn run(self: Arc<Self>) {
        // First attempt starts immediately; retries wait out the delay.
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
            delay = SESSION_RETRY_DELAY;

            let connector = Arc::new(Connector::new(self.config.clone()));
            let events = connector.start();
            {
                let mut guard = self.connector.lock().await;
                *guard = Some(Arc::clone(&connector));
            }

            self.drive_connector(&connector, events).await;

            {
                let mut guard = self.connector.lock().await;
                *guard = None;
            }
            connector.dispose();
            if self.is_running() {
                info!(
                    "connection attempt to {} over, retrying in {:?}",
                    self.config.hostname, delay
                );
            }
        }

        debug!("session task for {} stopped", self.config.hostname);
    }

    /// Consumes one connector's events until an error or shutdown ends the
    /// current connection attempt.
    async fn drive_connector(
        &self,
        connector: &Arc<Connector>,
        mut events: mpsc::Receiver<ConnectorEvent>,
    ) {
        let mut poll_task: Option<JoinHandle<()>> = None;

        loop {
            let event = tokio::select! {
                _ = self.shutdown_signal.notified() => break,
                event = events.recv() => event,
            };

            match event {
                Some(ConnectorEvent::LoginSuccess) => {
                    info!("logged in to {}", self.config.hostname);
                    self.set_status(SessionStatus::Online);
                    if let Some(task) = poll_task.take() {
                        task.abort();
                    }
                    poll_task = Some(spawn_poll(
                        Arc::clone(connector),
                        self.config.poll_interval(),
                    ));
                }
                Some(ConnectorEvent::ZoneStateUpdated(state)) => {
                    self.sink.zone_state_updated(state).await;
                }
                Some(ConnectorEvent::ConnectionError(message)) => {
                    warn!("connection to {} failed: {message}", self.config.hostname);
                    self.set_status(SessionStatus::Offline(message));
                    break;
                }
                None => break,
            }
        }

        if let Some(task) = poll_task {
            task.abort();
        }
    }

    /// Publishes a new availability only when it differs in kind from the
    /// current one, so repeated failures in one outage stay quiet.
    fn set_status(&self, status: SessionStatus) {
        self.status_tx.send_if_modified(|current| {
            if std::mem::discriminant(current) == std::mem::discriminant(&status) {
                return false;
            }
            *current = status;
            true
        });
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Polls the switch's full status: once right away, then on every interval
/// tick until the task is aborted with its connection attempt.
fn spawn_poll(connector: Arc<Connector>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        loop {
            ticker.tick().await;
            connector.read_status().await;
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
