//! Transport seam between the session core and a concrete socket.

use crate::error::SessionResult;
use crate::infrastructure::session::engine::SessionEvent;
use crate::infrastructure::session::protocol::DeviceUrl;
use tokio::sync::mpsc;

/// Something that happened on one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake finished; frames may now be sent.
    Opened,
    /// One inbound text frame.
    Frame(String),
    /// The peer closed the link or the stream ended.
    Closed,
    /// Socket failure; the link is unusable.
    Failed(String),
}

/// Event sender handed to one transport, stamped with the generation of the
/// connect call that created it.
#[derive(Debug, Clone)]
pub struct TransportEvents {
    tx: mpsc::UnboundedSender<SessionEvent>,
    generation: u64,
}

impl TransportEvents {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue an event for the session. Returns false once the session is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(SessionEvent::Transport {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// An open (or opening) link to the device.
pub trait TransportLink: Send {
    /// Queue one text frame. Delivery is not acknowledged.
    fn send_text(&mut self, frame: String) -> SessionResult<()>;

    /// Close the link. Events it emits afterwards are discarded by the session.
    fn close(&mut self);
}

/// Creates transports. `open` must not block; the handshake outcome is
/// reported later through `events`.
pub trait Connector: Send {
    fn open(
        &mut self,
        url: &DeviceUrl,
        events: TransportEvents,
    ) -> SessionResult<Box<dyn TransportLink>>;
}
