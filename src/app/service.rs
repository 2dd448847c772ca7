//! Link server — the hexagonal core.
//!
//! [`LinkServer`] owns the session FSM and its shared context.  Every
//! transport event goes through [`LinkServer::handle_event`]; the FSM
//! writes transport actions and observer events into the context, and the
//! server applies them to the injected ports afterwards.
//!
//! ```text
//!  EventQueue ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       LinkServer        │
//! GattTransport ◀─│  FSM · Reassembler ·    │◀──▶ PayloadPort
//!                 │  Chunker               │
//!                 └────────────────────────┘
//! ```

use log::{debug, error, info, warn};

use crate::config::LinkConfig;
use crate::error::Error;
use crate::events::{EventQueue, LinkEvent};
use crate::fsm::context::{LinkAction, SessionContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::protocol::codec::Envelope;
use crate::protocol::profile::{PeerId, Status};

use super::commands::ServerCommand;
use super::events::SessionEvent;
use super::ports::{EventSink, GattTransport, PayloadPort};

// ───────────────────────────────────────────────────────────────
// Transfer statistics
// ───────────────────────────────────────────────────────────────

/// Running counters since the server was constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub messages_received: u32,
    pub bytes_received: u64,
    pub messages_sent: u32,
    /// Encoded bytes, header included.
    pub bytes_sent: u64,
    pub transfers_aborted: u32,
    pub anomalies: u32,
}

impl TransferStats {
    fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Received { len } => {
                self.messages_received += 1;
                self.bytes_received += *len as u64;
            }
            SessionEvent::Sent { bytes } => {
                self.messages_sent += 1;
                self.bytes_sent += *bytes as u64;
            }
            SessionEvent::TransferAborted(_) => self.transfers_aborted += 1,
            SessionEvent::Anomaly(_) => self.anomalies += 1,
            _ => {}
        }
    }
}

// ───────────────────────────────────────────────────────────────
// LinkServer
// ───────────────────────────────────────────────────────────────

/// The GATT link server: one session, one connection at a time.
pub struct LinkServer {
    fsm: Fsm,
    ctx: SessionContext,
    running: bool,
    stats: TransferStats,
}

impl LinkServer {
    /// Construct the server from configuration.
    ///
    /// Does **not** open the transport; call [`start`](Self::start) next.
    pub fn new(config: LinkConfig) -> Self {
        let ctx = SessionContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);
        Self {
            fsm,
            ctx,
            running: false,
            stats: TransferStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Validate the configuration, open the transport and start advertising.
    ///
    /// An invalid configuration or a missing or disabled adapter is
    /// reported to the operator and returned; nothing is retried.
    pub fn start(
        &mut self,
        transport: &mut impl GattTransport,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        if self.running {
            debug!("start ignored, server already running");
            return Ok(());
        }

        if let Err(e) = self.ctx.config.validate() {
            error!("{}", e);
            sink.emit(&SessionEvent::Message(e.to_string()));
            sink.emit(&SessionEvent::Status(Status::ServerStopped));
            return Err(e);
        }

        if let Err(e) = transport.open() {
            error!("{}", e);
            sink.emit(&SessionEvent::Message(e.to_string()));
            sink.emit(&SessionEvent::Status(Status::ServerStopped));
            return Err(e.into());
        }

        info!("Server started");
        self.running = true;
        self.fsm.start(&mut self.ctx);
        self.advertise(transport);
        self.flush_reports(sink);
        Ok(())
    }

    /// Stop advertising, close the transport and discard every buffer.
    pub fn stop(&mut self, transport: &mut impl GattTransport, sink: &mut impl EventSink) {
        if !self.running {
            return;
        }

        transport.stop_advertising();
        // No re-advertise on the way down.
        self.ctx.peer = None;
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.ctx.discard_transfers();
        let _ = self.ctx.take_actions();
        transport.close();
        self.running = false;

        info!("Server stopped");
        self.ctx.report(SessionEvent::Status(Status::ServerStopped));
        self.flush_reports(sink);
    }

    /// Process an operator command.
    pub fn handle_command(
        &mut self,
        cmd: ServerCommand,
        transport: &mut impl GattTransport,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match cmd {
            ServerCommand::Start => self.start(transport, sink),
            ServerCommand::Stop => {
                self.stop(transport, sink);
                Ok(())
            }
            ServerCommand::Restart => {
                info!("Restarting server");
                self.stop(transport, sink);
                self.start(transport, sink)
            }
        }
    }

    // ── Event handling ────────────────────────────────────────

    /// Handle one transport event to completion.
    ///
    /// Must not be called concurrently; route callbacks through an
    /// [`EventQueue`] and use [`process_queue`](Self::process_queue).
    pub fn handle_event(
        &mut self,
        event: LinkEvent,
        transport: &mut impl GattTransport,
        payloads: &mut impl PayloadPort,
        sink: &mut impl EventSink,
    ) {
        if !self.running {
            debug!("dropping {} event, server stopped", event.name());
            return;
        }

        self.fsm.dispatch(&event, &mut self.ctx);

        if let Some(envelope) = self.ctx.take_inbound() {
            self.complete_receive(envelope, payloads);
        }

        self.apply_actions(transport);
        self.flush_reports(sink);
    }

    /// Drain every queued event in FIFO order.  Returns how many were handled.
    pub fn process_queue(
        &mut self,
        queue: &EventQueue,
        transport: &mut impl GattTransport,
        payloads: &mut impl PayloadPort,
        sink: &mut impl EventSink,
    ) -> usize {
        queue.drain(|event| self.handle_event(event, transport, payloads, sink))
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current session state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// Connected central, if any.
    pub fn peer(&self) -> Option<&PeerId> {
        self.ctx.peer.as_ref()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.ctx.notifications_enabled
    }

    pub fn config(&self) -> &LinkConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Hand the payload over and start the reply, if there is one.
    fn complete_receive(&mut self, envelope: Envelope, payloads: &mut impl PayloadPort) {
        payloads.on_payload(envelope.payload());

        let Some(bytes) = payloads.next_reply() else {
            debug!("no reply queued");
            self.fsm.force_transition(StateId::Connected, &mut self.ctx);
            return;
        };

        let started = Envelope::with_version(self.ctx.config.protocol_version, bytes)
            .map_err(Error::from)
            .and_then(|reply| self.ctx.begin_send(&reply));
        match started {
            Ok(()) => self.fsm.force_transition(StateId::SendingData, &mut self.ctx),
            Err(e) => {
                error!("Reply not sent: {}", e);
                self.ctx.report(SessionEvent::TransferAborted(e));
                self.fsm.force_transition(StateId::Connected, &mut self.ctx);
            }
        }
    }

    /// Translate queued FSM actions into transport calls.
    fn apply_actions(&mut self, transport: &mut impl GattTransport) {
        loop {
            let actions = self.ctx.take_actions();
            if actions.is_empty() {
                break;
            }
            for action in actions {
                match action {
                    LinkAction::Notify(packet) => {
                        if !self.ctx.notifications_enabled {
                            debug!("notifying before the central subscribed");
                        }
                        if let Err(e) = transport.notify(&packet) {
                            warn!("{}", e);
                            // Same path as a failed delivery ack.
                            self.fsm
                                .dispatch(&LinkEvent::DeliveryAck { success: false }, &mut self.ctx);
                        }
                    }
                    LinkAction::Readvertise => self.advertise(transport),
                }
            }
        }
    }

    fn advertise(&mut self, transport: &mut impl GattTransport) {
        match transport.start_advertising() {
            Ok(()) => {
                info!("Start advertising...");
                self.ctx.report(SessionEvent::Status(Status::Advertising));
            }
            Err(e) => {
                error!("{}", e);
                self.ctx.report(SessionEvent::Message(e.to_string()));
            }
        }
    }

    fn flush_reports(&mut self, sink: &mut impl EventSink) {
        for event in self.ctx.take_reports() {
            self.stats.record(&event);
            sink.emit(&event);
        }
    }
}
