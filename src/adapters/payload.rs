//! Payload port adapters.
//!
//! [`StaticReply`] answers every request with the same content, the way a
//! device serves a fixed document.  [`EchoReply`] sends each request back.

use log::info;

use crate::app::ports::PayloadPort;

/// Replies with a fixed payload after every received message.
#[derive(Debug, Clone)]
pub struct StaticReply {
    content: Vec<u8>,
    last_request: Option<Vec<u8>>,
}

impl StaticReply {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            last_request: None,
        }
    }

    /// The most recent payload received, if any.
    pub fn last_request(&self) -> Option<&[u8]> {
        self.last_request.as_deref()
    }
}

impl PayloadPort for StaticReply {
    fn on_payload(&mut self, payload: &[u8]) {
        info!("Payload received: {} bytes", payload.len());
        self.last_request = Some(payload.to_vec());
    }

    fn next_reply(&mut self) -> Option<Vec<u8>> {
        self.last_request.as_ref()?;
        Some(self.content.clone())
    }
}

/// Sends every received payload straight back.
#[derive(Debug, Default)]
pub struct EchoReply {
    pending: Option<Vec<u8>>,
}

impl EchoReply {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PayloadPort for EchoReply {
    fn on_payload(&mut self, payload: &[u8]) {
        self.pending = Some(payload.to_vec());
    }

    fn next_reply(&mut self) -> Option<Vec<u8>> {
        self.pending.take()
    }
}
