//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers, no closures and no
//! dynamic dispatch.
//!
//! ```text
//!  IDLE ──[connect]──▶ CONNECTED ──[first write]──▶ RECEIVING_DATA
//!    ▲                   ▲   ▲                           │
//!    │                   │   └──[receive error]──────────┤
//!    │                   │                        [envelope complete]
//!    │                   │                               ▼
//!    │                   └──[last ack / failed ack]── SENDING_DATA
//!    │
//!  Any state ──[disconnect]──▶ IDLE (buffers cleared, re-advertise)
//! ```
//!
//! The move out of RECEIVING_DATA after a complete envelope is made by the
//! server: it consults the payload port and either starts a reply
//! (SENDING_DATA) or returns to CONNECTED.

use log::{debug, info, warn};

use super::context::{LinkAction, SessionContext};
use super::{StateDescriptor, StateId};
use crate::app::events::SessionEvent;
use crate::error::{Error, TransferError};
use crate::events::LinkEvent;
use crate::protocol::chunker::SendOutcome;
use crate::protocol::codec::HEADER_SIZE;
use crate::protocol::profile::Status;
use crate::protocol::reassembler::ReceiveOutcome;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per server.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_event: idle_event,
        },
        // Index 1 — Connected
        StateDescriptor {
            id: StateId::Connected,
            name: "Connected",
            on_enter: None,
            on_exit: None,
            on_event: connected_event,
        },
        // Index 2 — ReceivingData
        StateDescriptor {
            id: StateId::ReceivingData,
            name: "ReceivingData",
            on_enter: None,
            on_exit: Some(receiving_exit),
            on_event: receiving_event,
        },
        // Index 3 — SendingData
        StateDescriptor {
            id: StateId::SendingData,
            name: "SendingData",
            on_enter: None,
            on_exit: Some(sending_exit),
            on_event: sending_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut SessionContext) {
    ctx.discard_transfers();
    ctx.notifications_enabled = false;
    if let Some(peer) = ctx.peer.take() {
        info!("Device disconnected: {}", peer.mac());
        ctx.push_action(LinkAction::Readvertise);
    }
}

fn idle_event(ctx: &mut SessionContext, event: &LinkEvent) -> Option<StateId> {
    match event {
        LinkEvent::Connected(peer) => {
            info!("Device connected: {} ({})", peer.display_name(), peer.mac());
            ctx.peer = Some(peer.clone());
            ctx.report(SessionEvent::PeerConnected(peer.clone()));
            Some(StateId::Connected)
        }
        LinkEvent::Disconnected => None,
        LinkEvent::CharacteristicWrite(_)
        | LinkEvent::DescriptorWrite { .. }
        | LinkEvent::DeliveryAck { .. } => {
            ctx.anomaly(TransferError::NotConnected);
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTED state
// ═══════════════════════════════════════════════════════════════════════════

fn connected_event(ctx: &mut SessionContext, event: &LinkEvent) -> Option<StateId> {
    match event {
        LinkEvent::CharacteristicWrite(packet) => {
            ctx.reassembler.reset();
            match absorb_write(ctx, packet) {
                Ok(()) => Some(StateId::ReceivingData),
                Err(e) => {
                    abort_transfer(ctx, e);
                    None
                }
            }
        }
        LinkEvent::DeliveryAck { .. } => {
            ctx.anomaly(TransferError::AckWhileIdle);
            None
        }
        other => on_connection_event(ctx, StateId::Connected, other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  RECEIVING_DATA state
// ═══════════════════════════════════════════════════════════════════════════

fn receiving_event(ctx: &mut SessionContext, event: &LinkEvent) -> Option<StateId> {
    match event {
        LinkEvent::CharacteristicWrite(packet) => match absorb_write(ctx, packet) {
            Ok(()) => None,
            Err(e) => {
                abort_transfer(ctx, e);
                Some(StateId::Connected)
            }
        },
        LinkEvent::DeliveryAck { .. } => {
            ctx.anomaly(TransferError::AckWhileIdle);
            None
        }
        other => on_connection_event(ctx, StateId::ReceivingData, other),
    }
}

fn receiving_exit(ctx: &mut SessionContext) {
    ctx.reassembler.reset();
}

// ═══════════════════════════════════════════════════════════════════════════
//  SENDING_DATA state
// ═══════════════════════════════════════════════════════════════════════════

fn sending_event(ctx: &mut SessionContext, event: &LinkEvent) -> Option<StateId> {
    match event {
        LinkEvent::DeliveryAck { success: true } => match ctx.chunker.on_delivery_ack() {
            Ok(SendOutcome::MorePending(packet)) => {
                ctx.report(SessionEvent::SendProgress {
                    bytes_sent: ctx.chunker.bytes_sent(),
                    total: ctx.chunker.total_bytes(),
                });
                ctx.push_action(LinkAction::Notify(packet));
                None
            }
            Ok(SendOutcome::Complete(bytes)) => {
                info!("Reply delivered: {} bytes", bytes);
                ctx.report(SessionEvent::Sent { bytes });
                Some(StateId::Connected)
            }
            Err(e) => {
                ctx.anomaly(e);
                Some(StateId::Connected)
            }
        },
        LinkEvent::DeliveryAck { success: false } => {
            let dropped = ctx.chunker.reset();
            warn!("Notification not delivered, abandoning {} bytes", dropped);
            abort_transfer(ctx, TransferError::DeliveryFailure.into());
            Some(StateId::Connected)
        }
        LinkEvent::CharacteristicWrite(_) => {
            ctx.anomaly(TransferError::WriteWhileSending);
            None
        }
        other => on_connection_event(ctx, StateId::SendingData, other),
    }
}

fn sending_exit(ctx: &mut SessionContext) {
    let dropped = ctx.chunker.reset();
    if dropped > 0 {
        debug!("send interrupted with {} bytes pending", dropped);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Events handled identically by every connected state.
///
/// Enabling notifications shows its own status while the descriptor write
/// is applied, then restores the status of `current`.
fn on_connection_event(
    ctx: &mut SessionContext,
    current: StateId,
    event: &LinkEvent,
) -> Option<StateId> {
    match event {
        LinkEvent::Disconnected => Some(StateId::Idle),
        LinkEvent::DescriptorWrite { notifications } => {
            if *notifications {
                ctx.report(SessionEvent::Status(Status::EnablingNotifications));
            }
            info!(
                "Notifications {}",
                if *notifications { "enabled" } else { "disabled" }
            );
            ctx.notifications_enabled = *notifications;
            ctx.report(SessionEvent::NotificationsChanged(*notifications));
            if *notifications {
                ctx.report(SessionEvent::Status(current.status()));
            }
            None
        }
        LinkEvent::Connected(peer) => {
            warn!("Ignoring second connection from {}", peer.mac());
            ctx.anomaly(TransferError::AlreadyConnected);
            None
        }
        // Writes and acks are state-specific and never routed here.
        LinkEvent::CharacteristicWrite(_) | LinkEvent::DeliveryAck { .. } => None,
    }
}

/// Feed one written packet to the reassembler and report progress.
fn absorb_write(ctx: &mut SessionContext, data: &[u8]) -> crate::Result<()> {
    match ctx.reassembler.on_packet(data)? {
        ReceiveOutcome::NeedHeader => {
            debug!("header incomplete after {} bytes", ctx.reassembler.bytes_so_far());
        }
        ReceiveOutcome::HeaderParsed {
            expected_length,
            bytes_so_far,
        } => {
            info!("Receiving {} byte payload", expected_length);
            ctx.report(SessionEvent::ReceiveProgress {
                bytes_so_far,
                total: usize::from(expected_length) + HEADER_SIZE,
            });
        }
        ReceiveOutcome::InProgress(bytes_so_far) => {
            let total = ctx
                .reassembler
                .expected_length()
                .map_or(bytes_so_far, |len| usize::from(len) + HEADER_SIZE);
            ctx.report(SessionEvent::ReceiveProgress {
                bytes_so_far,
                total,
            });
        }
        ReceiveOutcome::Complete {
            envelope,
            bytes_so_far,
        } => {
            info!("Received {} byte payload", envelope.length());
            ctx.report(SessionEvent::ReceiveProgress {
                bytes_so_far,
                total: bytes_so_far,
            });
            ctx.report(SessionEvent::Received {
                len: envelope.payload().len(),
            });
            ctx.complete_inbound(envelope);
        }
    }
    Ok(())
}

fn abort_transfer(ctx: &mut SessionContext, error: Error) {
    warn!("Transfer aborted: {}", error);
    ctx.report(SessionEvent::TransferAborted(error));
}
