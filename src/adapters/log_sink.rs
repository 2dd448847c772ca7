//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each session event as one
//! structured line through the `log` facade.  A status label or a test
//! recorder would implement the same trait.

use log::{info, warn};

use crate::app::events::SessionEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SessionEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Status(status) => info!("STATUS | {}", status),
            SessionEvent::Message(msg) => info!("MSG | {}", msg),
            SessionEvent::PeerConnected(peer) => {
                info!("PEER | Device connected");
                info!("PEER | Name: {}", peer.display_name());
                info!("PEER | MAC: {}", peer.mac());
            }
            SessionEvent::ReceiveProgress {
                bytes_so_far,
                total,
            } => info!("RX | {}/{} bytes", bytes_so_far, total),
            SessionEvent::SendStarted { total } => info!("TX | sending {} bytes", total),
            SessionEvent::SendProgress { bytes_sent, total } => {
                info!("TX | {}/{} bytes", bytes_sent, total)
            }
            SessionEvent::Received { len } => info!("RX | complete, payload {} bytes", len),
            SessionEvent::Sent { bytes } => info!("TX | complete, {} bytes", bytes),
            SessionEvent::TransferAborted(e) => warn!("ABORT | {}", e),
            SessionEvent::Anomaly(e) => warn!("ANOMALY | {}", e),
            SessionEvent::NotificationsChanged(on) => {
                info!("CCC | notifications {}", if *on { "enabled" } else { "disabled" })
            }
        }
    }
}
