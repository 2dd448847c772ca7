//! Mock adapters for integration tests.
//!
//! Records every transport call and every session event so tests can
//! assert on the full history without a GATT stack.

use std::collections::VecDeque;

use gattlink::app::events::SessionEvent;
use gattlink::app::ports::{EventSink, GattTransport, PayloadPort};
use gattlink::app::service::LinkServer;
use gattlink::config::LinkConfig;
use gattlink::error::TransportError;
use gattlink::events::LinkEvent;
use gattlink::protocol::packet::Packet;
use gattlink::protocol::profile::{PeerId, Status};

// ── Transport call record ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Open,
    StartAdvertising,
    StopAdvertising,
    Notify(Vec<u8>),
    Close,
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    pub calls: Vec<TransportCall>,
    pub open_error: Option<TransportError>,
    pub advertise_error: Option<i32>,
    pub fail_notify: bool,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes of every notification sent so far.
    pub fn notified_sizes(&self) -> Vec<usize> {
        self.notifications().iter().map(Vec::len).collect()
    }

    pub fn notifications(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Notify(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &TransportCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl GattTransport for MockTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Open);
        self.open_error.map_or(Ok(()), Err)
    }

    fn start_advertising(&mut self) -> Result<(), TransportError> {
        self.calls.push(TransportCall::StartAdvertising);
        match self.advertise_error {
            Some(code) => Err(TransportError::AdvertiseFailed(code)),
            None => Ok(()),
        }
    }

    fn stop_advertising(&mut self) {
        self.calls.push(TransportCall::StopAdvertising);
    }

    fn notify(&mut self, packet: &Packet) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Notify(packet.as_bytes().to_vec()));
        if self.fail_notify {
            Err(TransportError::NotifyFailed)
        } else {
            Ok(())
        }
    }

    fn close(&mut self) {
        self.calls.push(TransportCall::Close);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SessionEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Status(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    /// `bytes_so_far` of every receive progress report, in order.
    pub fn receive_progress(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::ReceiveProgress { bytes_so_far, .. } => Some(*bytes_so_far),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Message(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, event: &SessionEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedPayloads ──────────────────────────────────────────

/// Records received payloads and hands out queued replies in order.
#[derive(Default)]
pub struct ScriptedPayloads {
    pub received: Vec<Vec<u8>>,
    pub replies: VecDeque<Vec<u8>>,
}

#[allow(dead_code)]
impl ScriptedPayloads {
    pub fn replying(replies: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            received: Vec::new(),
            replies: replies.into_iter().collect(),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }
}

impl PayloadPort for ScriptedPayloads {
    fn on_payload(&mut self, payload: &[u8]) {
        self.received.push(payload.to_vec());
    }

    fn next_reply(&mut self) -> Option<Vec<u8>> {
        self.replies.pop_front()
    }
}

// ── Harness ───────────────────────────────────────────────────

/// A started server plus its mocks.
pub struct Harness {
    pub server: LinkServer,
    pub transport: MockTransport,
    pub payloads: ScriptedPayloads,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Harness {
    pub fn start(config: LinkConfig, payloads: ScriptedPayloads) -> Self {
        let mut h = Self {
            server: LinkServer::new(config),
            transport: MockTransport::new(),
            payloads,
            sink: RecordingSink::new(),
        };
        h.server
            .start(&mut h.transport, &mut h.sink)
            .expect("server start");
        h
    }

    pub fn event(&mut self, event: LinkEvent) {
        self.server.handle_event(
            event,
            &mut self.transport,
            &mut self.payloads,
            &mut self.sink,
        );
    }

    pub fn connect(&mut self) {
        self.event(LinkEvent::Connected(PeerId::new([0xC0, 0xFF, 0xEE, 0, 0, 1])));
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.event(LinkEvent::CharacteristicWrite(
            Packet::from_slice(bytes).expect("packet"),
        ));
    }

    pub fn ack(&mut self, success: bool) {
        self.event(LinkEvent::DeliveryAck { success });
    }

    pub fn disconnect(&mut self) {
        self.event(LinkEvent::Disconnected);
    }
}
