//! Outbound chunker: flow-controlled packet sender.
//!
//! One envelope is encoded and split into transport-sized packets.  The
//! transport allows exactly one outstanding notification, so the next
//! packet is only released after the previous one is acknowledged.
//!
//! ```text
//! begin(env) ──▶ packet 1 ──ack──▶ packet 2 ──ack──▶ … packet N ──ack──▶ Complete(total)
//! ```

use log::debug;

use super::codec::Envelope;
use super::packet::{MAX_PACKET_CAPACITY, Packet};
use crate::error::{Error, TransferError};

/// Ordered packets of one encoded envelope.
///
/// Stores the encoded bytes once and cuts packets on demand; the
/// concatenation of everything popped equals the encoded envelope.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    encoded: Vec<u8>,
    packet_size: usize,
    cursor: usize,
}

impl OutboundQueue {
    pub fn new(encoded: Vec<u8>, packet_size: usize) -> Self {
        Self {
            encoded,
            packet_size: packet_size.clamp(1, MAX_PACKET_CAPACITY),
            cursor: 0,
        }
    }

    /// Next packet in order, or `None` once exhausted.
    pub fn pop_front(&mut self) -> Option<Packet> {
        if self.cursor >= self.encoded.len() {
            return None;
        }
        let end = (self.cursor + self.packet_size).min(self.encoded.len());
        let packet = Packet::from_slice(&self.encoded[self.cursor..end]).ok()?;
        self.cursor = end;
        Some(packet)
    }

    /// Packets still queued.
    pub fn len(&self) -> usize {
        self.remaining_bytes().div_ceil(self.packet_size)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bytes() == 0
    }

    pub fn remaining_bytes(&self) -> usize {
        self.encoded.len() - self.cursor
    }

    /// Size of the whole encoded envelope.
    pub fn total_bytes(&self) -> usize {
        self.encoded.len()
    }
}

impl Iterator for OutboundQueue {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        self.pop_front()
    }
}

/// Split encoded bytes into `ceil(len / packet_size)` packets.
pub fn split_packets(encoded: &[u8], packet_size: usize) -> Vec<Packet> {
    OutboundQueue::new(encoded.to_vec(), packet_size).collect()
}

/// Result of a successful delivery ack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Emit this packet next.
    MorePending(Packet),
    /// Every packet acknowledged; carries total bytes delivered.
    Complete(usize),
}

/// Flow-controlled sender for one envelope at a time.
pub struct OutboundChunker {
    packet_size: usize,
    queue: Option<OutboundQueue>,
    in_flight: usize,
    bytes_sent: usize,
}

impl OutboundChunker {
    pub fn new(packet_size: usize) -> Self {
        Self {
            packet_size: packet_size.clamp(1, MAX_PACKET_CAPACITY),
            queue: None,
            in_flight: 0,
            bytes_sent: 0,
        }
    }

    /// Encode `envelope`, queue its packets and return the first one to emit.
    pub fn begin(&mut self, envelope: &Envelope) -> crate::Result<Packet> {
        if self.queue.is_some() {
            return Err(TransferError::SendAlreadyInProgress.into());
        }
        let mut queue = OutboundQueue::new(envelope.to_bytes(), self.packet_size);
        debug!(
            "chunker: {} bytes in {} packets of <= {}",
            queue.total_bytes(),
            queue.len(),
            self.packet_size
        );
        // An encoded envelope is never shorter than its 3-byte header.
        let first = queue
            .pop_front()
            .ok_or(Error::Transfer(TransferError::NoSendInProgress))?;
        self.bytes_sent = 0;
        self.in_flight = first.len();
        self.queue = Some(queue);
        Ok(first)
    }

    /// The packet in flight was delivered; release the next one.
    pub fn on_delivery_ack(&mut self) -> crate::Result<SendOutcome> {
        let Some(queue) = self.queue.as_mut() else {
            return Err(TransferError::NoSendInProgress.into());
        };
        self.bytes_sent += self.in_flight;
        match queue.pop_front() {
            Some(next) => {
                self.in_flight = next.len();
                Ok(SendOutcome::MorePending(next))
            }
            None => {
                let total = self.bytes_sent;
                self.queue = None;
                self.in_flight = 0;
                Ok(SendOutcome::Complete(total))
            }
        }
    }

    /// Drop any queued packets.  Returns the number of bytes never delivered.
    pub fn reset(&mut self) -> usize {
        let dropped = self
            .queue
            .take()
            .map_or(0, |q| q.remaining_bytes() + self.in_flight);
        self.in_flight = 0;
        self.bytes_sent = 0;
        dropped
    }

    pub fn is_active(&self) -> bool {
        self.queue.is_some()
    }

    /// Bytes acknowledged so far in the current send.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Encoded size of the current send, 0 when idle.
    pub fn total_bytes(&self) -> usize {
        self.queue.as_ref().map_or(0, OutboundQueue::total_bytes)
    }

    pub fn packet_size(&self) -> usize {
        self.packet_size
    }
}

// ── Tests ────────────────────────────────────────────────────
