//! Device Session Wire Protocol
//!
//! Outbound frames are single-line command strings (see
//! [`crate::domain::command::RemoteCommand`]). Inbound frames are JSON objects
//! carrying zero or more physiological readings:
//!
//! ```text
//! {"heartRate": 77, "bloodOxygen": 98.5, "temperature": 36.7}
//! ```
//!
//! Only those three keys are read, and only when their value is a number.
//! Anything else in the object is ignored.

use crate::domain::telemetry::TelemetryStore;
use crate::error::{SessionError, SessionResult};
use serde_json::Value;
use std::fmt;
use std::net::Ipv6Addr;

/// URL scheme of the device channel
pub const SCHEME: &str = "ws";

pub const HEART_RATE_KEY: &str = "heartRate";
pub const BLOOD_OXYGEN_KEY: &str = "bloodOxygen";
pub const TEMPERATURE_KEY: &str = "temperature";

/// A validated `ws://host:port` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUrl {
    host: String,
    port: u16,
}

impl DeviceUrl {
    pub fn parse(host: &str, port: &str) -> SessionResult<Self> {
        let host = host.trim();
        let port = port.trim();

        if host.is_empty() {
            return Err(SessionError::Construction("host is empty".into()));
        }
        if host.contains("://") {
            return Err(SessionError::Construction(format!(
                "host `{}` must not include a scheme",
                host
            )));
        }
        if let Some(c) = host
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
        {
            return Err(SessionError::Construction(format!(
                "host `{}` contains invalid character {:?}",
                host, c
            )));
        }
        if host.contains(':') && host.parse::<Ipv6Addr>().is_err() {
            return Err(SessionError::Construction(format!(
                "host `{}` is not a valid address",
                host
            )));
        }

        let port = match port.parse::<u16>() {
            Ok(0) | Err(_) => {
                return Err(SessionError::Construction(format!(
                    "port `{}` is not in 1-65535",
                    port
                )))
            }
            Ok(p) => p,
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for DeviceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", SCHEME, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", SCHEME, self.host, self.port)
        }
    }
}

/// Readings carried by one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryUpdate {
    pub heart_rate: Option<f64>,
    pub blood_oxygen: Option<f64>,
    pub temperature: Option<f64>,
}

impl TelemetryUpdate {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none() && self.blood_oxygen.is_none() && self.temperature.is_none()
    }

    /// Write every present reading into the store.
    pub fn apply(&self, store: &TelemetryStore) {
        if let Some(v) = self.heart_rate {
            store.set_heart_rate(v);
        }
        if let Some(v) = self.blood_oxygen {
            store.set_blood_oxygen(v);
        }
        if let Some(v) = self.temperature {
            store.set_temperature(v);
        }
    }
}

/// Decode one inbound text frame.
pub fn decode_frame(text: &str) -> SessionResult<TelemetryUpdate> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SessionError::MalformedFrame(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| SessionError::MalformedFrame("expected a JSON object".into()))?;

    let number = |key: &str| object.get(key).and_then(Value::as_f64);

    Ok(TelemetryUpdate {
        heart_rate: number(HEART_RATE_KEY),
        blood_oxygen: number(BLOOD_OXYGEN_KEY),
        temperature: number(TEMPERATURE_KEY),
    })
}
