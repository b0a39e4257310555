//! WebSocket transport
//!
//! Each link is one tokio task that owns the socket. The session talks to it
//! through an unbounded channel and hears back through [`TransportEvents`].

use crate::error::{SessionError, SessionResult};
use crate::infrastructure::session::protocol::DeviceUrl;
use crate::infrastructure::session::transport::{
    Connector, TransportEvent, TransportEvents, TransportLink,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Opens `ws://` links on the current tokio runtime.
#[derive(Debug, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn open(
        &mut self,
        url: &DeviceUrl,
        events: TransportEvents,
    ) -> SessionResult<Box<dyn TransportLink>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::Construction(format!("no async runtime: {}", e)))?;

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_link(url.to_string(), rx, events));

        Ok(Box::new(WsLink { outbound: tx }))
    }
}

struct WsLink {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl TransportLink for WsLink {
    fn send_text(&mut self, frame: String) -> SessionResult<()> {
        self.outbound
            .send(Outbound::Text(frame))
            .map_err(|_| SessionError::Transport("link task has stopped".into()))
    }

    fn close(&mut self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

async fn run_link(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: TransportEvents,
) {
    let generation = events.generation();
    info!("Opening device link #{} to {}", generation, url);

    let connect = connect_async(url.as_str());
    tokio::pin!(connect);

    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    error!("Device link #{} handshake failed: {}", generation, e);
                    events.emit(TransportEvent::Failed(e.to_string()));
                    return;
                }
            },
            msg = outbound.recv() => match msg {
                Some(Outbound::Text(frame)) => {
                    warn!("Dropping frame queued before link #{} opened: {}", generation, frame);
                }
                Some(Outbound::Close) | None => {
                    debug!("Device link #{} abandoned during handshake", generation);
                    return;
                }
            },
        }
    };

    events.emit(TransportEvent::Opened);
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            msg = outbound.recv() => match msg {
                Some(Outbound::Text(frame)) => {
                    trace!("-> #{} {}", generation, frame);
                    if let Err(e) = sink.send(Message::Text(frame)).await {
                        error!("Device link #{} write failed: {}", generation, e);
                        events.emit(TransportEvent::Failed(e.to_string()));
                        return;
                    }
                }
                Some(Outbound::Close) | None => {
                    debug!("Closing device link #{}", generation);
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    trace!("<- #{} {}", generation, text);
                    events.emit(TransportEvent::Frame(text));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        events.emit(TransportEvent::Frame(text));
                    }
                    Err(_) => debug!("Ignoring non UTF-8 binary frame on link #{}", generation),
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("Device closed link #{}", generation);
                    events.emit(TransportEvent::Closed);
                    return;
                }
                // Ping/pong replies are handled by tungstenite.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("Device link #{} read failed: {}", generation, e);
                    events.emit(TransportEvent::Failed(e.to_string()));
                    return;
                }
            },
        }
    }
}
