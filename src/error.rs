//! Device session errors
//!
//! Every failure the session can observe collapses into [`SessionError`].
//! None of them are fatal to the process: construction and transport
//! failures end the current session, send failures are reported through the
//! session's sticky `last_error`, and malformed frames are dropped.

use thiserror::Error;

/// Convenience alias for results carrying a [`SessionError`].
pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The transport could not be created (bad host/port, unsupported address).
    #[error("Cannot open device session: {0}")]
    Construction(String),

    /// Socket-level failure after the transport was created.
    #[error("Device link failed: {0}")]
    Transport(String),

    /// A command was issued while no device was connected.
    #[error("Not connected to a device, `{command}` was not sent")]
    NotConnected { command: String },

    /// An inbound frame could not be decoded.
    #[error("Malformed telemetry frame: {0}")]
    MalformedFrame(String),

    /// The session actor is no longer running.
    #[error("Device session has been shut down")]
    SessionStopped,
}
