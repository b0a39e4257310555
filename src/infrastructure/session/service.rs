//! Device Session Service
//!
//! Wires the [`SessionCore`] to a single event queue. The [`SessionActor`]
//! drains that queue sequentially, so operator commands and transport events
//! never race on session state or joystick edge state. [`SessionHandle`] is
//! the cloneable front door the rest of the application uses.

use crate::domain::command::RemoteCommand;
use crate::domain::dispatcher::ControlInput;
use crate::domain::models::{
    ControlSurface, EndpointAddress, JoystickVector, Operator, SessionState,
};
use crate::domain::settings::ControlSettings;
use crate::domain::telemetry::TelemetryStore;
use crate::error::{SessionError, SessionResult};
use crate::infrastructure::session::engine::{
    SessionCommand, SessionCore, SessionEvent, SessionSnapshot,
};
use crate::infrastructure::session::protocol::DeviceUrl;
use crate::infrastructure::session::transport::Connector;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

pub struct DeviceSession;

impl DeviceSession {
    /// Build a session around `connector`. Nothing runs until
    /// [`SessionActor::run`] is polled.
    pub fn new(
        connector: impl Connector + 'static,
        controls: ControlSettings,
    ) -> (SessionHandle, SessionActor) {
        let telemetry = TelemetryStore::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let (core, snapshot_rx) =
            SessionCore::new(Box::new(connector), controls, telemetry.clone(), tx.clone());

        let handle = SessionHandle {
            tx,
            snapshot_rx,
            telemetry,
        };
        let actor = SessionActor { core, events: rx };
        (handle, actor)
    }

    /// Build a session and run its actor on the current tokio runtime.
    pub fn spawn(connector: impl Connector + 'static, controls: ControlSettings) -> SessionHandle {
        let (handle, actor) = Self::new(connector, controls);
        tokio::spawn(actor.run());
        handle
    }
}

pub struct SessionActor {
    core: SessionCore,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionActor {
    /// Process events until [`SessionHandle::shutdown`] is called.
    pub async fn run(mut self) {
        info!("Device session started");
        while let Some(event) = self.events.recv().await {
            if !self.core.handle(event) {
                break;
            }
        }
        self.core.disconnect();
        info!("Device session stopped");
    }
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    telemetry: TelemetryStore,
}

impl SessionHandle {
    fn post(&self, command: SessionCommand) -> SessionResult<()> {
        self.tx
            .send(SessionEvent::Command(command))
            .map_err(|_| SessionError::SessionStopped)
    }

    /// Start connecting to `target`, replacing any current link.
    ///
    /// Returns immediately. A malformed host or port is reported here as
    /// well as through `last_error`; everything else arrives through the
    /// snapshot.
    pub fn connect(&self, target: EndpointAddress, operator: Operator) -> SessionResult<()> {
        let validated = DeviceUrl::parse(&target.host, &target.port).map(|_| ());
        self.post(SessionCommand::Connect { target, operator })?;
        validated
    }

    pub fn disconnect(&self) -> SessionResult<()> {
        self.post(SessionCommand::Disconnect)
    }

    /// Fire-and-forget write. `NotConnected` lands in `last_error`.
    pub fn send(&self, command: RemoteCommand) -> SessionResult<()> {
        self.post(SessionCommand::Send(command))
    }

    pub fn control(&self, input: ControlInput) {
        if let Err(e) = self.post(SessionCommand::Control(input)) {
            warn!("Input dropped: {}", e);
        }
    }

    pub fn move_up(&self) {
        self.control(ControlInput::MoveUp);
    }

    pub fn move_down(&self) {
        self.control(ControlInput::MoveDown);
    }

    pub fn move_left(&self) {
        self.control(ControlInput::MoveLeft);
    }

    pub fn move_right(&self) {
        self.control(ControlInput::MoveRight);
    }

    pub fn stop_moving(&self) {
        self.control(ControlInput::StopMoving);
    }

    pub fn light_on(&self) {
        self.control(ControlInput::LightOn);
    }

    pub fn light_off(&self) {
        self.control(ControlInput::LightOff);
    }

    pub fn alarm_on(&self) {
        self.control(ControlInput::AlarmOn);
    }

    pub fn alarm_off(&self) {
        self.control(ControlInput::AlarmOff);
    }

    pub fn speed_increase(&self) {
        self.control(ControlInput::SpeedIncrease);
    }

    pub fn speed_decrease(&self) {
        self.control(ControlInput::SpeedDecrease);
    }

    pub fn select_mode(&self, mode: Option<String>) {
        self.control(ControlInput::SelectMode(mode));
    }

    pub fn reset(&self) {
        self.control(ControlInput::Reset);
    }

    pub fn joystick_move(&self, surface: ControlSurface, vector: JoystickVector) {
        self.control(ControlInput::Joystick { surface, vector });
    }

    pub fn update_controls(&self, controls: ControlSettings) -> SessionResult<()> {
        self.post(SessionCommand::UpdateControls(controls))
    }

    pub fn clear_error(&self) -> SessionResult<()> {
        self.post(SessionCommand::ClearError)
    }

    /// Close the link and stop the actor.
    pub fn shutdown(&self) -> SessionResult<()> {
        self.post(SessionCommand::Shutdown)
    }

    pub fn state(&self) -> SessionState {
        self.snapshot_rx.borrow().state
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.snapshot_rx.borrow().last_error.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }
}
