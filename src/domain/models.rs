use serde::{Deserialize, Serialize};

/// Lifecycle of the single device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected(DisconnectReason),
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    /// True while a transport is pending or open.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Connecting => "CONNECTING...",
            SessionState::Connected => "CONNECTED",
            SessionState::Disconnected(_) => "DISCONNECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The transport could not be created.
    ConstructionFailed,
    /// The socket failed after construction.
    TransportFailed,
}

/// Operator role as reported by the account backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorRole {
    /// Drives someone else's device; the device needs no token from us.
    #[default]
    Controlling,
    /// Owner of the device; must authorise the link with an access token.
    Controlled,
}

impl OperatorRole {
    pub fn requires_device_authorization(&self) -> bool {
        matches!(self, OperatorRole::Controlled)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperatorRole::Controlling => "Controlling",
            OperatorRole::Controlled => "Controlled",
        }
    }
}

/// Who is opening the session, handed over by value on each connect.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Operator {
    pub role: OperatorRole,
    pub access_token: Option<String>,
}

impl Operator {
    pub fn new(role: OperatorRole, access_token: Option<String>) -> Self {
        Self { role, access_token }
    }
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("role", &self.role)
            .field("has_token", &self.access_token.is_some())
            .finish()
    }
}

/// A previously used device, persisted by the saved-endpoint store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub id: u64,
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Unix milliseconds
    #[serde(default)]
    pub last_connected_at: Option<i64>,
}

/// The `(name, host, port)` triple the session needs to open a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAddress {
    pub name: String,
    pub host: String,
    pub port: String,
}

impl EndpointAddress {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: port.into(),
        }
    }
}

impl From<&DeviceEndpoint> for EndpointAddress {
    fn from(endpoint: &DeviceEndpoint) -> Self {
        Self {
            name: endpoint.name.clone(),
            host: endpoint.host.clone(),
            port: endpoint.port.to_string(),
        }
    }
}

/// Joystick deflection, both components in [-1, 1]. Y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JoystickVector {
    pub x: f64,
    pub y: f64,
}

impl JoystickVector {
    pub const NEUTRAL: JoystickVector = JoystickVector { x: 0.0, y: 0.0 };

    /// Clamps into the unit square; non-finite components read as neutral.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: sanitize(x),
            y: sanitize(y),
        }
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Which on-screen surface produced a joystick sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSurface {
    /// The main drive joystick.
    Joystick,
    /// The joystick that replaces the direction pad.
    Pad,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Remote,
    Settings,
}
