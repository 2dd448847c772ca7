//! Outbound session events.
//!
//! The [`LinkServer`](super::service::LinkServer) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  They are purely
//! observational: a sink that drops every event changes nothing about the
//! protocol.

use crate::error::Error;
use crate::protocol::profile::{PeerId, Status};

/// Structured events emitted by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Coarse status after a transition or lifecycle change.
    Status(Status),

    /// Human-readable operator message (e.g. "Bluetooth disabled").
    Message(String),

    /// A central connected.
    PeerConnected(PeerId),

    /// Inbound progress; both counts include the 3-byte header.
    ReceiveProgress { bytes_so_far: usize, total: usize },

    /// An outbound envelope of `total` encoded bytes was queued.
    SendStarted { total: usize },

    /// Outbound progress after an acknowledged packet.
    SendProgress { bytes_sent: usize, total: usize },

    /// A complete inbound payload of `len` bytes was reassembled.
    Received { len: usize },

    /// Every packet of the outbound envelope was acknowledged.
    Sent { bytes: usize },

    /// The current transfer was dropped; the session is back in `Connected`.
    TransferAborted(Error),

    /// An out-of-order event was ignored.
    Anomaly(Error),

    /// The central toggled notifications on the CCC descriptor.
    NotificationsChanged(bool),
}
