//! Device Session Module
//!
//! One supervised, bidirectional link to the wheelchair.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  SessionCommand   ┌──────────────────────────┐
//! │ SessionHandle├──────────────────►│       SessionActor       │
//! └──────┬───────┘                   │  ┌────────────────────┐  │
//!        │ snapshot / telemetry      │  │    SessionCore     │  │
//!        ◄───────────────────────────┤  │ state · dispatcher │  │
//!                                    │  └─────────┬──────────┘  │
//!                  TransportEvent    └────────────┼─────────────┘
//!        ┌───────────────────────────────────────►│ send_text / close
//!        │                                        ▼
//! ┌──────┴──────────────────────────────────────────────────────┐
//! │            Connector / TransportLink (WebSocket)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - device address validation and inbound frame decoding
//! - [`transport`] - the transport traits and event type
//! - [`websocket`] - `ws://` transport on tokio-tungstenite
//! - [`engine`] - the session state machine
//! - [`service`] - actor loop and public handle

pub mod engine;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod websocket;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{SessionCommand, SessionEvent, SessionSnapshot};
pub use service::{DeviceSession, SessionActor, SessionHandle};
pub use websocket::WsConnector;
