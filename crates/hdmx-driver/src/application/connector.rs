//! Protocol connector: validates and formats commands going to the switch
//! and interprets the lines coming back.
//!
//! One connector serves one connection attempt. It owns a transport,
//! consumes the transport's event stream on a spawned task, and publishes
//! [`ConnectorEvent`]s for the session to act on. Commands are
//! fire-and-forget: validation happens here, before anything touches the
//! wire, and after that the only confirmation is the switch's `Command OK`
//! line in the debug log.

use std::sync::Arc;
use std::time::Duration;

use hdmx_core::{parse_line, MatrixCommand, ProfileAction, ResponseLine, ZoneState};
use hdmx_core::MAX_SUPPORTED_PROFILES;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, trace, warn};

use crate::config::SessionConfig;
use crate::infrastructure::transport::{create_transport, Transport, TransportEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Pause between the login lines. The switch drops input that arrives
/// while it is still processing the previous credential line.
const LOGIN_STEP_DELAY: Duration = Duration::from_millis(300);

/// A command rejected before reaching the wire. These are caller errors
/// and never retryable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The zone number is outside the configured output range.
    #[error("zone number must be in range [1, {max}], got {zone}")]
    ZoneOutOfRange { zone: u8, max: u8 },

    /// The input number is outside the configured source range.
    #[error("input number must be in range [1, {max}], got {input}")]
    InputOutOfRange { input: u8, max: u8 },

    /// The profile number is outside the switch's fixed profile range.
    #[error("profile number must be in range [1, {MAX_SUPPORTED_PROFILES}], got {0}")]
    ProfileOutOfRange(u8),
}

/// Events published by the connector to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorEvent {
    /// The switch acknowledged the login with its banner line.
    LoginSuccess,
    /// The connection failed, was lost, or produced an impossible status
    /// line. The session decides whether and when to rebuild.
    ConnectionError(String),
    /// The switch reported the state of one output zone.
    ZoneStateUpdated(ZoneState),
}

/// Speaks the switch's line protocol over one transport.
pub struct Connector {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
}

impl Connector {
    /// Creates a connector with the transport selected by the config.
    pub fn new(config: SessionConfig) -> Self {
        let transport = create_transport(&config);
        Self { config, transport }
    }

    /// Creates a connector over an externally supplied transport.
    pub fn with_transport(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Starts the transport and the event translation task.
    ///
    /// Returns the stream of [`ConnectorEvent`]s. The stream ends when the
    /// connector is disposed.
    pub fn start(&self) -> mpsc::Receiver<ConnectorEvent> {
        let mut transport_rx = Arc::clone(&self.transport).start();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let transport = Arc::clone(&self.transport);
        let config = self.config.clone();

        tokio::spawn(async move {
            while let Some(event) = transport_rx.recv().await {
                let publish = match event {
                    TransportEvent::Connected => {
                        spawn_login(&transport, &config);
                        None
                    }
                    TransportEvent::ConnectionFailed(message) => {
                        Some(ConnectorEvent::ConnectionError(message))
                    }
                    TransportEvent::Disconnected => Some(ConnectorEvent::ConnectionError(
                        "connection to the switch was lost".to_string(),
                    )),
                    TransportEvent::Line(line) => interpret_line(&line, &config),
                };
                if let Some(event) = publish {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
            debug!("connector event task finished");
        });

        rx
    }

    /// Tears the transport down. Idempotent; the event stream ends shortly
    /// after.
    pub fn dispose(&self) {
        self.transport.shutdown();
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Routes input `input` to output zone `zone`.
    pub async fn switch_input(&self, input: u8, zone: u8) -> Result<(), CommandError> {
        self.check_input(input)?;
        self.check_zone(zone)?;
        self.send(MatrixCommand::SwitchInput { input, zone }).await;
        Ok(())
    }

    /// Mutes or unmutes the audio of output zone `zone`.
    pub async fn set_mute(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        self.check_zone(zone)?;
        self.send(MatrixCommand::Mute { zone, on }).await;
        Ok(())
    }

    /// Turns zone audio on or off. The switch has no audio command, only
    /// mute, so this is the inverted mute.
    pub async fn set_audio(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        self.set_mute(zone, !on).await
    }

    /// Turns the video output of zone `zone` on or off.
    pub async fn set_video(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        self.check_zone(zone)?;
        self.send(MatrixCommand::Video { zone, on }).await;
        Ok(())
    }

    /// Enables or disables CEC on output zone `zone`.
    pub async fn set_cec(&self, zone: u8, on: bool) -> Result<(), CommandError> {
        self.check_zone(zone)?;
        self.send(MatrixCommand::Cec { zone, on }).await;
        Ok(())
    }

    /// Stores the current routing as profile `number`.
    pub async fn save_profile(&self, number: u8) -> Result<(), CommandError> {
        self.check_profile(number)?;
        self.send(MatrixCommand::Profile {
            number,
            action: ProfileAction::Save,
        })
        .await;
        Ok(())
    }

    /// Recalls the routing stored as profile `number`.
    pub async fn load_profile(&self, number: u8) -> Result<(), CommandError> {
        self.check_profile(number)?;
        self.send(MatrixCommand::Profile {
            number,
            action: ProfileAction::Load,
        })
        .await;
        Ok(())
    }

    /// Asks the switch to report the status of every zone.
    pub async fn read_status(&self) {
        self.send(MatrixCommand::ReadStatus).await;
    }

    // ── Validation and transmission ───────────────────────────────────────────

    fn check_zone(&self, zone: u8) -> Result<(), CommandError> {
        let max = self.config.output_zones;
        if zone < 1 || zone > max {
            return Err(CommandError::ZoneOutOfRange { zone, max });
        }
        Ok(())
    }

    fn check_input(&self, input: u8) -> Result<(), CommandError> {
        let max = self.config.input_sources;
        if input < 1 || input > max {
            return Err(CommandError::InputOutOfRange { input, max });
        }
        Ok(())
    }

    fn check_profile(&self, number: u8) -> Result<(), CommandError> {
        if number < 1 || number > MAX_SUPPORTED_PROFILES {
            return Err(CommandError::ProfileOutOfRange(number));
        }
        Ok(())
    }

    async fn send(&self, command: MatrixCommand) {
        // The switch only accepts lower-case commands.
        let line = command.to_wire().to_lowercase();
        trace!("sending to switch: {line}");
        self.transport.send_line(&line).await;
    }
}

/// Sends the credentials on a task of their own so a slow login never
/// stalls line processing. No response correlation: the switch confirms
/// with its banner line, which arrives through the normal read path.
fn spawn_login(transport: &Arc<dyn Transport>, config: &SessionConfig) {
    // The switch rejects credentials containing upper-case characters
    // anyway, so lower-case them like every other outbound line.
    let username = config.username.to_lowercase();
    let password = config.password.to_lowercase();
    let transport = Arc::clone(transport);

    tokio::spawn(async move {
        debug!("connected, sending login");
        if !username.is_empty() {
            transport.send_line(&username).await;
            time::sleep(LOGIN_STEP_DELAY).await;
        }
        if !password.is_empty() {
            transport.send_line(&password).await;
            time::sleep(LOGIN_STEP_DELAY).await;
        }
    });
}

/// Translates one inbound line into at most one connector event.
fn interpret_line(line: &str, config: &SessionConfig) -> Option<ConnectorEvent> {
    match parse_line(line) {
        ResponseLine::ZoneStatus {
            zone,
            input,
            video_on,
            audio_on,
        } => {
            if zone < 1 || zone > config.output_zones {
                warn!(
                    "switch reported zone {zone}, outside the configured {} zones",
                    config.output_zones
                );
                return Some(ConnectorEvent::ConnectionError(format!(
                    "status line for unconfigured zone {zone}: {line}"
                )));
            }
            let state = ZoneState::new(zone, input.to_string(), !audio_on, video_on);
            Some(ConnectorEvent::ZoneStateUpdated(state))
        }
        ResponseLine::ConnectionEstablished => {
            debug!("switch accepted the login");
            Some(ConnectorEvent::LoginSuccess)
        }
        ResponseLine::Ack => {
            debug!("switch answered: Command OK");
            None
        }
        ResponseLine::Nack => {
            error!("switch rejected a command: Command incorrect");
            None
        }
        ResponseLine::Unrecognized => {
            trace!("ignoring unrecognized line from switch: {line}");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Transport double that records sent lines and replays scripted events.
    struct ScriptedTransport {
        sent: StdMutex<Vec<String>>,
        events: StdMutex<Option<mpsc::Receiver<TransportEvent>>>,
    }

    impl ScriptedTransport {
        fn new() -> (Arc<Self>, mpsc::Sender<TransportEvent>) {
            let (tx, rx) = mpsc::channel(16);
            let transport = Arc::new(Self {
                sent: StdMutex::new(Vec::new()),
                events: StdMutex::new(Some(rx)),
            });
            (transport, tx)
        }

        fn sent_lines(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        fn start(self: Arc<Self>) -> mpsc::Receiver<TransportEvent> {
            self.events
                .lock()
                .unwrap()
                .take()
                .expect("start called twice")
        }

        async fn send_line(&self, line: &str) {
            self.sent.lock().unwrap().push(line.to_string());
        }

        fn shutdown(&self) {}
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            hostname: "10.0.0.5".to_string(),
            port: 23,
            transport: TransportKind::Telnet,
            username: "Administrator".to_string(),
            password: "Password".to_string(),
            input_sources: 8,
            output_zones: 8,
            poll_interval_secs: 30,
            input_names: String::new(),
            profile_names: String::new(),
        }
    }

    fn connector_with_script() -> (Connector, Arc<ScriptedTransport>, mpsc::Sender<TransportEvent>)
    {
        let (transport, tx) = ScriptedTransport::new();
        let connector =
            Connector::with_transport(test_config(), Arc::clone(&transport) as Arc<dyn Transport>);
        (connector, transport, tx)
    }

    #[tokio::test]
    async fn test_zone_out_of_range_sends_nothing() {
        let (connector, transport, _tx) = connector_with_script();

        let err = connector.set_mute(9, true).await.unwrap_err();
        assert_eq!(err, CommandError::ZoneOutOfRange { zone: 9, max: 8 });

        let err = connector.set_video(0, true).await.unwrap_err();
        assert_eq!(err, CommandError::ZoneOutOfRange { zone: 0, max: 8 });

        assert!(transport.sent_lines().is_empty());
    }

    #[tokio::test]
    async fn test_input_out_of_range_sends_nothing() {
        let (connector, transport, _tx) = connector_with_script();

        let err = connector.switch_input(9, 1).await.unwrap_err();
        assert_eq!(err, CommandError::InputOutOfRange { input: 9, max: 8 });
        assert!(transport.sent_lines().is_empty());
    }

    #[tokio::test]
    async fn test_profile_bounds_are_fixed_at_sixteen() {
        let (connector, transport, _tx) = connector_with_script();

        assert_eq!(
            connector.save_profile(0).await.unwrap_err(),
            CommandError::ProfileOutOfRange(0)
        );
        assert_eq!(
            connector.load_profile(17).await.unwrap_err(),
            CommandError::ProfileOutOfRange(17)
        );
        assert!(transport.sent_lines().is_empty());

        connector.save_profile(1).await.unwrap();
        connector.load_profile(16).await.unwrap();
        assert_eq!(transport.sent_lines(), vec!["profile f1 save", "profile f16 load"]);
    }

    #[tokio::test]
    async fn test_commands_reach_the_wire_lower_cased() {
        let (connector, transport, _tx) = connector_with_script();

        connector.switch_input(5, 3).await.unwrap();
        connector.set_mute(3, true).await.unwrap();
        connector.set_video(12, true).await.unwrap_err();
        connector.set_cec(3, false).await.unwrap();
        connector.read_status().await;

        assert_eq!(
            transport.sent_lines(),
            vec!["sw i05 o03", "mute o03 on", "cec o03 off", "read"]
        );
    }

    #[tokio::test]
    async fn test_set_audio_inverts_to_mute() {
        let (connector, transport, _tx) = connector_with_script();

        connector.set_audio(2, true).await.unwrap();
        connector.set_audio(2, false).await.unwrap();

        assert_eq!(transport.sent_lines(), vec!["mute o02 off", "mute o02 on"]);
    }

    #[tokio::test]
    async fn test_banner_line_yields_login_success_and_no_zone_state() {
        let (connector, _transport, tx) = connector_with_script();
        let mut rx = connector.start();

        tx.send(TransportEvent::Line(
            "Connection to 10.0.0.5 is established".to_string(),
        ))
        .await
        .unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(ConnectorEvent::LoginSuccess));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_status_lines_become_zone_state_updates() {
        let (connector, _transport, tx) = connector_with_script();
        let mut rx = connector.start();

        let line = "o03 i05 video ON audio OFF";
        tx.send(TransportEvent::Line(line.to_string())).await.unwrap();
        tx.send(TransportEvent::Line(line.to_string())).await.unwrap();
        drop(tx);

        // The same line twice yields two independent, equal notifications.
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first, second);
        match first {
            ConnectorEvent::ZoneStateUpdated(state) => {
                assert_eq!(state.zone, 3);
                assert_eq!(state.input, "5");
                assert!(state.mute);
                assert!(state.video_on);
                assert!(!state.audio_on());
            }
            other => panic!("expected ZoneStateUpdated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_line_for_unconfigured_zone_is_a_connection_error() {
        let (connector, _transport, tx) = connector_with_script();
        let mut rx = connector.start();

        tx.send(TransportEvent::Line(
            "o09 i01 video ON audio ON".to_string(),
        ))
        .await
        .unwrap();
        drop(tx);

        match rx.recv().await.unwrap() {
            ConnectorEvent::ConnectionError(msg) => assert!(msg.contains("zone 9"), "got: {msg}"),
            other => panic!("expected ConnectionError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ack_nack_and_noise_produce_no_events() {
        let (connector, _transport, tx) = connector_with_script();
        let mut rx = connector.start();

        tx.send(TransportEvent::Line("Command OK".to_string())).await.unwrap();
        tx.send(TransportEvent::Line("Command incorrect".to_string())).await.unwrap();
        tx.send(TransportEvent::Line("*** firmware v2.1 ***".to_string())).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_disconnect_surfaces_as_connection_error() {
        let (connector, _transport, tx) = connector_with_script();
        let mut rx = connector.start();

        tx.send(TransportEvent::Disconnected).await.unwrap();
        drop(tx);

        match rx.recv().await.unwrap() {
            ConnectorEvent::ConnectionError(msg) => assert!(msg.contains("lost"), "got: {msg}"),
            other => panic!("expected ConnectionError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_sends_credentials_lower_cased_in_order() {
        let (connector, transport, tx) = connector_with_script();
        let _rx = connector.start();

        tx.send(TransportEvent::Connected).await.unwrap();

        // The handshake runs on its own task with 300 ms pauses.
        time::sleep(Duration::from_millis(800)).await;
        assert_eq!(transport.sent_lines(), vec!["administrator", "password"]);
    }
}
