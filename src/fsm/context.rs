//! Shared mutable context threaded through every session handler.
//!
//! `SessionContext` owns the per-connection buffers (reassembler and
//! chunker), the connected peer, and two outboxes: transport actions the
//! server must perform, and session events for the observer.  Handlers
//! only ever write to the outboxes; the server applies them after each
//! event, so no handler touches the transport directly.

use crate::app::events::SessionEvent;
use crate::config::LinkConfig;
use crate::error::Error;
use crate::protocol::chunker::OutboundChunker;
use crate::protocol::codec::Envelope;
use crate::protocol::packet::Packet;
use crate::protocol::profile::PeerId;
use crate::protocol::reassembler::InboundReassembler;

// ---------------------------------------------------------------------------
// Transport actions (written by handlers; applied by the server)
// ---------------------------------------------------------------------------

/// Side effects requested from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Send one notification on the data characteristic.
    Notify(Packet),
    /// Re-open for a new connection after the peer left.
    Readvertise,
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct SessionContext {
    // -- Configuration --
    pub config: LinkConfig,

    // -- Connection --
    /// Connected central, `None` while idle.
    pub peer: Option<PeerId>,
    /// Whether the central enabled notifications on the CCC descriptor.
    pub notifications_enabled: bool,

    // -- Transfer buffers (exclusively owned, never aliased) --
    pub reassembler: InboundReassembler,
    pub chunker: OutboundChunker,

    // -- Outboxes --
    actions: Vec<LinkAction>,
    reports: Vec<SessionEvent>,
    /// Completed inbound envelope awaiting the payload port.
    inbound: Option<Envelope>,
}

impl SessionContext {
    /// Create a new context with the given configuration.
    pub fn new(config: LinkConfig) -> Self {
        let reassembler = InboundReassembler::from_config(&config);
        let chunker = OutboundChunker::new(config.packet_size());
        Self {
            config,
            peer: None,
            notifications_enabled: false,
            reassembler,
            chunker,
            actions: Vec::new(),
            reports: Vec::new(),
            inbound: None,
        }
    }

    /// Queue a transport side effect.
    pub fn push_action(&mut self, action: LinkAction) {
        self.actions.push(action);
    }

    /// Queue an observer event.
    pub fn report(&mut self, event: SessionEvent) {
        self.reports.push(event);
    }

    /// Queue an ordering anomaly.
    pub fn anomaly(&mut self, error: impl Into<Error>) {
        self.reports.push(SessionEvent::Anomaly(error.into()));
    }

    pub fn take_actions(&mut self) -> Vec<LinkAction> {
        core::mem::take(&mut self.actions)
    }

    pub fn take_reports(&mut self) -> Vec<SessionEvent> {
        core::mem::take(&mut self.reports)
    }

    /// Park a completed inbound envelope for the server.
    pub fn complete_inbound(&mut self, envelope: Envelope) {
        self.inbound = Some(envelope);
    }

    /// Hand the completed envelope over, leaving nothing behind.
    pub fn take_inbound(&mut self) -> Option<Envelope> {
        self.inbound.take()
    }

    /// Start sending `envelope`: queues the first notification.
    pub fn begin_send(&mut self, envelope: &Envelope) -> Result<(), Error> {
        let first = self.chunker.begin(envelope)?;
        self.report(SessionEvent::SendStarted {
            total: envelope.encoded_len(),
        });
        self.push_action(LinkAction::Notify(first));
        Ok(())
    }

    /// Drop both transfer buffers and any parked envelope.
    pub fn discard_transfers(&mut self) {
        self.reassembler.reset();
        let dropped = self.chunker.reset();
        if dropped > 0 {
            log::info!("Discarded {} unsent bytes", dropped);
        }
        self.inbound = None;
    }
}
