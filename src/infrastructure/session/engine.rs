//! Session Core
//!
//! The synchronous state machine behind the device session. It owns the one
//! transport link, the session state, the sticky last error and the command
//! dispatcher. Every mutation goes through [`SessionCore::handle`], which the
//! session actor calls for one queued event at a time.
//!
//! ```text
//! Idle --connect--> Connecting --Opened--> Connected --Closed/disconnect--> Idle
//!                   Connecting/Connected --Failed--> Disconnected(TransportFailed)
//!        connect with a bad address --> Disconnected(ConstructionFailed)
//! ```

use crate::domain::command::RemoteCommand;
use crate::domain::dispatcher::{CommandDispatcher, ControlInput};
use crate::domain::models::{DisconnectReason, EndpointAddress, Operator, SessionState};
use crate::domain::settings::ControlSettings;
use crate::domain::telemetry::TelemetryStore;
use crate::error::{SessionError, SessionResult};
use crate::infrastructure::session::protocol::{self, DeviceUrl};
use crate::infrastructure::session::transport::{
    Connector, TransportEvent, TransportEvents, TransportLink,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Requests from the application side.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Connect {
        target: EndpointAddress,
        operator: Operator,
    },
    Disconnect,
    Send(RemoteCommand),
    Control(ControlInput),
    UpdateControls(ControlSettings),
    ClearError,
    Shutdown,
}

/// Everything the session actor consumes, in arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Command(SessionCommand),
    Transport {
        generation: u64,
        event: TransportEvent,
    },
}

/// Observable view of the session published after every event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub last_error: Option<SessionError>,
    /// Target of the current or most recent connect.
    pub endpoint: Option<EndpointAddress>,
    pub url: Option<String>,
    /// Link generation; differs between two sessions even when both read
    /// `Connected`.
    pub generation: u64,
}

pub struct SessionCore {
    connector: Box<dyn Connector>,
    link: Option<Box<dyn TransportLink>>,
    /// Bumped on every connect and disconnect; events from older links are dropped.
    generation: u64,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    state: SessionState,
    last_error: Option<SessionError>,
    endpoint: Option<EndpointAddress>,
    url: Option<DeviceUrl>,
    operator: Operator,
    dispatcher: CommandDispatcher,
    telemetry: TelemetryStore,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionCore {
    pub fn new(
        connector: Box<dyn Connector>,
        controls: ControlSettings,
        telemetry: TelemetryStore,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let core = Self {
            connector,
            link: None,
            generation: 0,
            events_tx,
            state: SessionState::Idle,
            last_error: None,
            endpoint: None,
            url: None,
            operator: Operator::default(),
            dispatcher: CommandDispatcher::new(controls),
            telemetry,
            snapshot_tx,
        };
        (core, snapshot_rx)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Apply one event. Returns `false` when the session should stop.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Command(command) => match command {
                SessionCommand::Connect { target, operator } => {
                    let _ = self.connect(target, operator);
                }
                SessionCommand::Disconnect => self.disconnect(),
                SessionCommand::Send(command) => {
                    let _ = self.send(command);
                }
                SessionCommand::Control(input) => self.control(input),
                SessionCommand::UpdateControls(controls) => {
                    debug!("Control settings updated: {:?}", controls);
                    self.dispatcher.set_controls(controls);
                }
                SessionCommand::ClearError => {
                    self.last_error = None;
                    self.publish();
                }
                SessionCommand::Shutdown => {
                    self.disconnect();
                    return false;
                }
            },
            SessionEvent::Transport { generation, event } => {
                self.on_transport_event(generation, event)
            }
        }
        true
    }

    /// Open a link to `target`, replacing any existing one.
    pub fn connect(&mut self, target: EndpointAddress, operator: Operator) -> SessionResult<()> {
        self.teardown();
        self.generation += 1;
        self.dispatcher.clear_axes();
        self.last_error = None;
        self.operator = operator;
        self.endpoint = Some(target.clone());
        self.url = None;

        let result = DeviceUrl::parse(&target.host, &target.port).and_then(|url| {
            let events = TransportEvents::new(self.events_tx.clone(), self.generation);
            let link = self.connector.open(&url, events)?;
            Ok((url, link))
        });

        match result {
            Ok((url, link)) => {
                info!(
                    "Connecting to {} at {} (link #{})",
                    target.name, url, self.generation
                );
                self.url = Some(url);
                self.link = Some(link);
                self.state = SessionState::Connecting;
                self.publish();
                Ok(())
            }
            Err(e) => {
                error!("Cannot connect to {}: {}", target.name, e);
                self.state = SessionState::Disconnected(DisconnectReason::ConstructionFailed);
                self.last_error = Some(e.clone());
                self.publish();
                Err(e)
            }
        }
    }

    /// Close the active link, if any, and return to `Idle`.
    pub fn disconnect(&mut self) {
        if self.link.is_none() && self.state == SessionState::Idle {
            return;
        }
        self.teardown();
        self.generation += 1;
        self.state = SessionState::Idle;
        info!("Device session closed");
        self.publish();
    }

    /// Write one command. Fails unless the session is `Connected`; the
    /// failure is also kept as the session's last error.
    pub fn send(&mut self, command: RemoteCommand) -> SessionResult<()> {
        let result = match (&self.state, self.link.as_mut()) {
            (SessionState::Connected, Some(link)) => {
                debug!("Sending {}", command);
                link.send_text(command.to_frame())
            }
            _ => Err(SessionError::NotConnected {
                command: command.to_string(),
            }),
        };

        if let Err(e) = &result {
            warn!("{}", e);
            self.last_error = Some(e.clone());
            self.publish();
        }
        result
    }

    /// Run operator input through the dispatcher and send what it produces.
    pub fn control(&mut self, input: ControlInput) {
        // Failures are recorded by `send`; the edge state advances regardless.
        for command in self.dispatcher.dispatch(input) {
            let _ = self.send(command);
        }
    }

    fn on_transport_event(&mut self, generation: u64, event: TransportEvent) {
        if generation != self.generation || self.link.is_none() {
            debug!(
                "Ignoring {:?} from stale link #{} (current #{})",
                event, generation, self.generation
            );
            return;
        }

        match event {
            TransportEvent::Opened => {
                if self.state != SessionState::Connecting {
                    debug!("Unexpected open in state {:?}", self.state);
                    return;
                }
                self.state = SessionState::Connected;
                info!("Device link #{} connected", generation);
                self.authorize();
                self.publish();
            }
            TransportEvent::Frame(text) => {
                if !self.state.is_connected() {
                    debug!("Dropping frame received while {:?}", self.state);
                    return;
                }
                match protocol::decode_frame(&text) {
                    Ok(update) if update.is_empty() => {
                        debug!("Frame without telemetry ignored");
                    }
                    Ok(update) => update.apply(&self.telemetry),
                    Err(e) => debug!("{}", e),
                }
            }
            TransportEvent::Closed => {
                self.link = None;
                self.state = SessionState::Idle;
                info!("Device link #{} closed by peer", generation);
                self.publish();
            }
            TransportEvent::Failed(reason) => {
                self.link = None;
                self.state = SessionState::Disconnected(DisconnectReason::TransportFailed);
                let e = SessionError::Transport(reason);
                error!("{}", e);
                self.last_error = Some(e);
                self.publish();
            }
        }
    }

    /// The access token has to be the first frame the device sees.
    fn authorize(&mut self) {
        if !self.operator.role.requires_device_authorization() {
            return;
        }
        match self.operator.access_token.clone() {
            Some(token) => {
                info!("Authorizing device link");
                let _ = self.send(RemoteCommand::AccessToken(token));
            }
            None => warn!("No access token available, device may reject commands"),
        }
    }

    fn teardown(&mut self) {
        if let Some(mut link) = self.link.take() {
            debug!("Closing link #{}", self.generation);
            link.close();
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            state: self.state,
            last_error: self.last_error.clone(),
            endpoint: self.endpoint.clone(),
            url: self.url.as_ref().map(|u| u.to_string()),
            generation: self.generation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ControlSurface, JoystickVector, OperatorRole};
    use crate::infrastructure::session::testing::RecordingConnector;

    struct Fixture {
        core: SessionCore,
        connector: RecordingConnector,
        telemetry: TelemetryStore,
        snapshots: watch::Receiver<SessionSnapshot>,
        _rx: mpsc::UnboundedReceiver<SessionEvent>,
    }

    fn fixture() -> Fixture {
        let connector = RecordingConnector::new();
        let telemetry = TelemetryStore::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let (core, snapshots) = SessionCore::new(
            Box::new(connector.clone()),
            ControlSettings::default(),
            telemetry.clone(),
            tx,
        );
        Fixture {
            core,
            connector,
            telemetry,
            snapshots,
            _rx: rx,
        }
    }

    fn desk() -> EndpointAddress {
        EndpointAddress::new("Desk", "192.168.1.5", "8080")
    }

    fn owner(token: &str) -> Operator {
        Operator::new(OperatorRole::Controlled, Some(token.to_string()))
    }

    impl Fixture {
        fn transport(&mut self, event: TransportEvent) {
            let generation = self.core.generation();
            self.core
                .handle(SessionEvent::Transport { generation, event });
        }

        fn connected(&mut self, operator: Operator) {
            self.core.connect(desk(), operator).unwrap();
            self.transport(TransportEvent::Opened);
            assert_eq!(self.core.state(), SessionState::Connected);
        }
    }

    #[test]
    fn test_connect_is_pending_until_opened() {
        let mut f = fixture();
        f.core.connect(desk(), Operator::default()).unwrap();

        assert_eq!(f.core.state(), SessionState::Connecting);
        assert_eq!(f.connector.opened(), vec!["ws://192.168.1.5:8080".to_string()]);
        let snapshot = f.snapshots.borrow().clone();
        assert_eq!(snapshot.state, SessionState::Connecting);
        assert_eq!(snapshot.url.as_deref(), Some("ws://192.168.1.5:8080"));
        assert_eq!(snapshot.endpoint, Some(desk()));

        f.transport(TransportEvent::Opened);
        assert_eq!(f.snapshots.borrow().state, SessionState::Connected);
    }

    #[test]
    fn test_token_is_first_frame_for_controlled_role() {
        let mut f = fixture();
        f.connected(owner("tok-123"));
        f.core.send(RemoteCommand::LightOn).unwrap();

        assert_eq!(
            f.connector.sent_frames(),
            vec!["access_token:tok-123".to_string(), "remote:light_on".into()]
        );
    }

    #[test]
    fn test_no_token_for_controlling_role() {
        let mut f = fixture();
        f.connected(Operator::new(
            OperatorRole::Controlling,
            Some("tok-123".into()),
        ));
        f.core.send(RemoteCommand::Forward).unwrap();

        assert_eq!(f.connector.sent_frames(), vec!["remote:forward".to_string()]);
    }

    #[test]
    fn test_controlled_role_without_token_sends_nothing_extra() {
        let mut f = fixture();
        f.connected(Operator::new(OperatorRole::Controlled, None));
        assert!(f.connector.sent_frames().is_empty());
    }

    #[test]
    fn test_send_requires_connected_state() {
        let mut f = fixture();
        let err = f.core.send(RemoteCommand::Forward).unwrap_err();
        assert_eq!(
            err,
            SessionError::NotConnected {
                command: "remote:forward".into()
            }
        );
        assert_eq!(f.core.last_error(), Some(&err));

        f.core.connect(desk(), Operator::default()).unwrap();
        assert!(f.core.send(RemoteCommand::Forward).is_err());
        assert!(f.connector.sent_frames().is_empty());
        assert_eq!(
            f.snapshots.borrow().last_error,
            Some(SessionError::NotConnected {
                command: "remote:forward".into()
            })
        );
    }

    #[test]
    fn test_construction_error() {
        let mut f = fixture();
        let err = f
            .core
            .connect(EndpointAddress::new("Desk", "192.168.1.5", "port"), Operator::default())
            .unwrap_err();

        assert!(matches!(err, SessionError::Construction(_)));
        assert_eq!(
            f.core.state(),
            SessionState::Disconnected(DisconnectReason::ConstructionFailed)
        );
        assert_eq!(f.core.last_error(), Some(&err));
        assert!(f.connector.opened().is_empty());
    }

    #[test]
    fn test_connector_failure_is_a_construction_error() {
        let mut f = fixture();
        f.connector.fail_next_open("socket limit reached");
        let err = f.core.connect(desk(), Operator::default()).unwrap_err();
        assert_eq!(
            err,
            SessionError::Construction("socket limit reached".into())
        );
        assert_eq!(
            f.core.state(),
            SessionState::Disconnected(DisconnectReason::ConstructionFailed)
        );
    }

    #[test]
    fn test_reconnect_replaces_link_exactly_once() {
        let mut f = fixture();
        f.connected(Operator::default());
        let first = f.core.generation();

        f.core
            .connect(EndpointAddress::new("Hall", "192.168.1.6", "8080"), Operator::default())
            .unwrap();
        assert_eq!(f.connector.closed(), vec![first]);
        assert_eq!(f.core.state(), SessionState::Connecting);

        // Late events from the replaced link change nothing.
        f.core.handle(SessionEvent::Transport {
            generation: first,
            event: TransportEvent::Opened,
        });
        f.core.handle(SessionEvent::Transport {
            generation: first,
            event: TransportEvent::Frame(r#"{"heartRate": 50}"#.into()),
        });
        f.core.handle(SessionEvent::Transport {
            generation: first,
            event: TransportEvent::Failed("gone".into()),
        });
        assert_eq!(f.core.state(), SessionState::Connecting);
        assert_eq!(f.core.last_error(), None);
        assert_eq!(f.telemetry.heart_rate(), None);

        f.transport(TransportEvent::Opened);
        assert_eq!(f.core.state(), SessionState::Connected);
        assert_eq!(f.connector.closed(), vec![first]);
    }

    #[test]
    fn test_reconnect_is_visible_in_snapshot() {
        let mut f = fixture();
        f.connected(Operator::default());
        let before = f.snapshots.borrow().clone();

        f.core
            .connect(EndpointAddress::new("Hall", "192.168.1.6", "8080"), Operator::default())
            .unwrap();
        f.transport(TransportEvent::Opened);
        let after = f.snapshots.borrow().clone();

        // Same state on both sides of the reconnect, different link.
        assert_eq!(before.state, SessionState::Connected);
        assert_eq!(after.state, SessionState::Connected);
        assert_ne!(before.generation, after.generation);
        assert_eq!(after.endpoint.map(|e| e.name), Some("Hall".to_string()));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut f = fixture();
        f.core.disconnect();
        assert_eq!(f.core.state(), SessionState::Idle);

        f.connected(Operator::default());
        let generation = f.core.generation();
        f.core.disconnect();
        f.core.disconnect();
        assert_eq!(f.core.state(), SessionState::Idle);
        assert_eq!(f.connector.closed(), vec![generation]);

        // Nothing from the closed link may revive the session.
        f.core.handle(SessionEvent::Transport {
            generation,
            event: TransportEvent::Opened,
        });
        assert_eq!(f.core.state(), SessionState::Idle);
    }

    #[test]
    fn test_disconnect_from_failed_state_resets_to_idle() {
        let mut f = fixture();
        f.connected(Operator::default());
        f.transport(TransportEvent::Failed("reset".into()));
        f.core.disconnect();
        assert_eq!(f.core.state(), SessionState::Idle);
    }

    #[test]
    fn test_transport_failure_while_connecting() {
        let mut f = fixture();
        f.core.connect(desk(), Operator::default()).unwrap();
        f.transport(TransportEvent::Failed("connection refused".into()));

        assert_eq!(
            f.core.state(),
            SessionState::Disconnected(DisconnectReason::TransportFailed)
        );
        assert_eq!(
            f.core.last_error(),
            Some(&SessionError::Transport("connection refused".into()))
        );
        // No automatic retry.
        assert_eq!(f.connector.opened().len(), 1);
    }

    #[test]
    fn test_peer_close_returns_to_idle() {
        let mut f = fixture();
        f.connected(Operator::default());
        f.transport(TransportEvent::Closed);
        assert_eq!(f.core.state(), SessionState::Idle);
        assert!(f.core.send(RemoteCommand::Stop).is_err());
    }

    #[test]
    fn test_frames_update_telemetry() {
        let mut f = fixture();
        f.connected(Operator::default());

        f.transport(TransportEvent::Frame(r#"{"heartRate": 77}"#.into()));
        assert_eq!(f.telemetry.heart_rate(), Some(77.0));
        assert_eq!(f.telemetry.blood_oxygen(), None);
        assert_eq!(f.telemetry.temperature(), None);

        f.transport(TransportEvent::Frame("not valid json".into()));
        f.transport(TransportEvent::Frame(r#"{"bloodOxygen": 97, "temperature": 36.8}"#.into()));
        assert_eq!(f.telemetry.heart_rate(), Some(77.0));
        assert_eq!(f.telemetry.blood_oxygen(), Some(97.0));
        assert_eq!(f.telemetry.temperature(), Some(36.8));
        assert_eq!(f.core.state(), SessionState::Connected);
        assert_eq!(f.core.last_error(), None);
    }

    #[test]
    fn test_telemetry_survives_disconnect() {
        let mut f = fixture();
        f.connected(Operator::default());
        f.transport(TransportEvent::Frame(r#"{"temperature": 37.1}"#.into()));
        f.core.disconnect();
        assert_eq!(f.telemetry.temperature(), Some(37.1));
    }

    #[test]
    fn test_joystick_scenario() {
        let mut f = fixture();
        f.connected(owner("tok"));

        let stick = |y: f64| ControlInput::Joystick {
            surface: ControlSurface::Joystick,
            vector: JoystickVector::new(0.0, y),
        };
        f.core.control(stick(-0.6));
        f.core.control(stick(-0.5));
        f.core.control(stick(0.0));
        f.core.disconnect();

        assert_eq!(
            f.connector.sent_frames(),
            vec![
                "access_token:tok".to_string(),
                "remote:forward".into(),
                "remote:stop".into(),
            ]
        );
        assert_eq!(f.core.state(), SessionState::Idle);
    }

    #[test]
    fn test_new_session_starts_from_neutral() {
        let mut f = fixture();
        f.connected(Operator::default());
        f.core.control(ControlInput::Joystick {
            surface: ControlSurface::Joystick,
            vector: JoystickVector::new(0.0, 0.9),
        });
        assert!(f.core.dispatcher().axes().is_moving());

        f.connected(Operator::default());
        assert!(!f.core.dispatcher().axes().is_moving());
    }

    #[test]
    fn test_clear_error_and_shutdown() {
        let mut f = fixture();
        let _ = f.core.send(RemoteCommand::Stop);
        assert!(f.core.last_error().is_some());

        assert!(f.core.handle(SessionEvent::Command(SessionCommand::ClearError)));
        assert_eq!(f.snapshots.borrow().last_error, None);

        f.connected(Operator::default());
        assert!(!f.core.handle(SessionEvent::Command(SessionCommand::Shutdown)));
        assert_eq!(f.core.state(), SessionState::Idle);
        assert_eq!(f.connector.closed().len(), 1);
    }
}
