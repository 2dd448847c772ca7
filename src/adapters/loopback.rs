//! In-process loopback transport and simulated central.
//!
//! [`LoopbackTransport`] implements [`GattTransport`] without a radio: it
//! records every notification and can be told to fail the way a real
//! adapter does.  [`SimulatedCentral`] is the client side of the same
//! protocol, built on the same codec, chunker and reassembler.
//!
//! ```text
//!  SimulatedCentral ──LinkEvent──▶ EventQueue ──▶ LinkServer
//!        ▲                                           │
//!        └────── pop_notification ◀─ LoopbackTransport ◀┘
//! ```

use std::collections::VecDeque;

use log::debug;

use crate::app::ports::{EventSink, GattTransport, PayloadPort};
use crate::app::service::LinkServer;
use crate::config::LinkConfig;
use crate::error::{Error, TransportError};
use crate::events::{EventQueue, LinkEvent};
use crate::protocol::chunker::split_packets;
use crate::protocol::codec::Envelope;
use crate::protocol::packet::Packet;
use crate::protocol::profile::PeerId;
use crate::protocol::reassembler::{InboundReassembler, ReceiveOutcome};

// ───────────────────────────────────────────────────────────────
// Transport
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LoopbackTransport {
    open_error: Option<TransportError>,
    advertise_error: Option<i32>,
    fail_notify: bool,
    open: bool,
    advertising: bool,
    advertise_count: u32,
    outbox: VecDeque<Packet>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose `open` always fails with `error`.
    pub fn failing_open(error: TransportError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::default()
        }
    }

    /// Make `start_advertising` fail with a stack error code.
    pub fn set_advertise_failure(&mut self, code: Option<i32>) {
        self.advertise_error = code;
    }

    /// Make `notify` refuse every packet.
    pub fn set_fail_notify(&mut self, fail: bool) {
        self.fail_notify = fail;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// Successful `start_advertising` calls so far.
    pub fn advertise_count(&self) -> u32 {
        self.advertise_count
    }

    /// Oldest notification not yet picked up by the central.
    pub fn pop_notification(&mut self) -> Option<Packet> {
        self.outbox.pop_front()
    }

    pub fn pending_notifications(&self) -> usize {
        self.outbox.len()
    }
}

impl GattTransport for LoopbackTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if let Some(e) = self.open_error {
            return Err(e);
        }
        self.open = true;
        Ok(())
    }

    fn start_advertising(&mut self) -> Result<(), TransportError> {
        if let Some(code) = self.advertise_error {
            return Err(TransportError::AdvertiseFailed(code));
        }
        self.advertising = true;
        self.advertise_count += 1;
        Ok(())
    }

    fn stop_advertising(&mut self) {
        self.advertising = false;
    }

    fn notify(&mut self, packet: &Packet) -> Result<(), TransportError> {
        if self.fail_notify || !self.open {
            return Err(TransportError::NotifyFailed);
        }
        self.outbox.push_back(packet.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.advertising = false;
        self.outbox.clear();
    }
}

// ───────────────────────────────────────────────────────────────
// Central
// ───────────────────────────────────────────────────────────────

/// Client half of the link.
pub struct SimulatedCentral {
    peer: PeerId,
    packet_size: usize,
    reassembler: InboundReassembler,
}

impl SimulatedCentral {
    pub fn new(peer: PeerId, packet_size: usize) -> Self {
        // The central accepts whatever packet size the server picked.
        let config = LinkConfig {
            split_header: true,
            ..LinkConfig::default()
        };
        Self {
            peer,
            packet_size,
            reassembler: InboundReassembler::from_config(&config),
        }
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    /// Encode and chunk a request into characteristic writes.
    pub fn request_packets(&self, payload: &[u8]) -> Result<Vec<Packet>, Error> {
        let envelope = Envelope::new(payload.to_vec())?;
        Ok(split_packets(&envelope.to_bytes(), self.packet_size))
    }

    /// Feed one notification; returns the reply once complete.
    pub fn on_notification(&mut self, packet: &[u8]) -> Result<Option<Envelope>, Error> {
        match self.reassembler.on_packet(packet)? {
            ReceiveOutcome::Complete { envelope, .. } => Ok(Some(envelope)),
            _ => Ok(None),
        }
    }

    /// Drop a partially received reply.
    pub fn reset(&mut self) {
        self.reassembler.reset();
    }
}

// ───────────────────────────────────────────────────────────────
// Request/reply driver
// ───────────────────────────────────────────────────────────────

/// Run one request/reply exchange through `queue`, the way GATT callbacks
/// would drive it.  Connects and subscribes first if no peer is connected.
///
/// Returns the reply payload, or `None` if the server stayed silent.
pub fn exchange(
    server: &mut LinkServer,
    transport: &mut LoopbackTransport,
    central: &mut SimulatedCentral,
    payloads: &mut impl PayloadPort,
    sink: &mut impl EventSink,
    queue: &EventQueue,
    request: &[u8],
) -> Result<Option<Vec<u8>>, Error> {
    if server.peer().is_none() {
        queue.push(LinkEvent::Connected(central.peer().clone()));
        queue.push(LinkEvent::DescriptorWrite {
            notifications: true,
        });
        server.process_queue(queue, transport, payloads, sink);
    }

    for packet in central.request_packets(request)? {
        queue.push(LinkEvent::CharacteristicWrite(packet));
        server.process_queue(queue, transport, payloads, sink);
    }

    let mut reply = None;
    while let Some(packet) = transport.pop_notification() {
        debug!("central: notification of {} bytes", packet.len());
        if let Some(envelope) = central.on_notification(&packet)? {
            reply = Some(envelope.into_payload());
        }
        queue.push(LinkEvent::DeliveryAck { success: true });
        server.process_queue(queue, transport, payloads, sink);
    }
    Ok(reply)
}
