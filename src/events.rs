//! Transport event queue.
//!
//! GATT stacks deliver callbacks on their own threads.  Every callback is
//! turned into a [`LinkEvent`] and pushed here; the single consumer drains
//! them in FIFO order into the server, so the session never sees two
//! events interleave.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ on_connect       │────▶│              │     │              │
//! │ on_disconnect    │────▶│  EventQueue  │────▶│  LinkServer  │
//! │ on_write         │────▶│  (bounded)   │     │  (consumer)  │
//! │ on_delivery_ack  │────▶│              │     │              │
//! └──────────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::protocol::packet::Packet;
use crate::protocol::profile::PeerId;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Inbound transport events, one variant per GATT server callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A central connected.
    Connected(PeerId),
    /// The central went away (from any state).
    Disconnected,
    /// The central wrote one packet to the data characteristic.
    CharacteristicWrite(Packet),
    /// The central wrote the CCC descriptor.
    DescriptorWrite { notifications: bool },
    /// The stack finished sending the last notification.
    DeliveryAck { success: bool },
}

impl LinkEvent {
    /// Short tag for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Disconnected => "disconnected",
            Self::CharacteristicWrite(_) => "write",
            Self::DescriptorWrite { .. } => "descriptor-write",
            Self::DeliveryAck { .. } => "delivery-ack",
        }
    }
}

/// Bounded multi-producer queue with a single draining consumer.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, LinkEvent, EVENT_QUEUE_CAP>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push an event.  Safe to call from any thread.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: LinkEvent) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(embassy_sync::channel::TrySendError::Full(dropped)) => {
                warn!("event queue full, dropping {} event", dropped.name());
                false
            }
        }
    }

    /// Pop the next event, `None` if the queue is empty.
    pub fn pop(&self) -> Option<LinkEvent> {
        self.channel.try_receive().ok()
    }

    /// Drain all pending events into a handler, in FIFO order.
    ///
    /// Events pushed by the handler itself are drained in the same call.
    pub fn drain(&self, mut handler: impl FnMut(LinkEvent)) -> usize {
        let mut count = 0;
        while let Some(event) = self.pop() {
            handler(event);
            count += 1;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
