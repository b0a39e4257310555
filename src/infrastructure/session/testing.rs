//! In-memory transport used by the session tests.

use crate::error::{SessionError, SessionResult};
use crate::infrastructure::session::protocol::DeviceUrl;
use crate::infrastructure::session::transport::{Connector, TransportEvents, TransportLink};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Recording {
    opened: Vec<String>,
    sent: Vec<String>,
    closed: Vec<u64>,
    events: Vec<TransportEvents>,
    fail_next: Option<String>,
}

/// Records every open, frame and close; clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap()
    }

    pub fn opened(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    pub fn sent_frames(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Generations of the links that were closed, in order.
    pub fn closed(&self) -> Vec<u64> {
        self.lock().closed.clone()
    }

    /// Event sender of the most recently opened link.
    pub fn last_events(&self) -> Option<TransportEvents> {
        self.lock().events.last().cloned()
    }

    pub fn fail_next_open(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }
}

impl Connector for RecordingConnector {
    fn open(
        &mut self,
        url: &DeviceUrl,
        events: TransportEvents,
    ) -> SessionResult<Box<dyn TransportLink>> {
        let mut recording = self.lock();
        if let Some(message) = recording.fail_next.take() {
            return Err(SessionError::Construction(message));
        }
        recording.opened.push(url.to_string());
        let generation = events.generation();
        recording.events.push(events);

        Ok(Box::new(RecordingLink {
            generation,
            inner: self.inner.clone(),
        }))
    }
}

struct RecordingLink {
    generation: u64,
    inner: Arc<Mutex<Recording>>,
}

impl TransportLink for RecordingLink {
    fn send_text(&mut self, frame: String) -> SessionResult<()> {
        self.inner.lock().unwrap().sent.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.inner.lock().unwrap().closed.push(self.generation);
    }
}
