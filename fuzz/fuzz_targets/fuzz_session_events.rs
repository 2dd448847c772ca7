//! Fuzz target: `LinkServer::handle_event`
//!
//! Decodes the input into an arbitrary sequence of link events and plays
//! it against a running server.  No sequence may panic, and the session
//! invariants must hold after every event.
//!
//! cargo fuzz run fuzz_session_events

#![no_main]

use gattlink::adapters::loopback::LoopbackTransport;
use gattlink::adapters::payload::EchoReply;
use gattlink::app::events::SessionEvent;
use gattlink::app::ports::EventSink;
use gattlink::app::service::LinkServer;
use gattlink::config::LinkConfig;
use gattlink::events::LinkEvent;
use gattlink::fsm::StateId;
use gattlink::protocol::packet::Packet;
use gattlink::protocol::profile::PeerId;
use libfuzzer_sys::fuzz_target;

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &SessionEvent) {}
}

fn next_event(data: &mut &[u8]) -> Option<LinkEvent> {
    let (&tag, rest) = data.split_first()?;
    *data = rest;
    let event = match tag % 5 {
        0 => LinkEvent::Connected(PeerId::new([tag; 6])),
        1 => LinkEvent::Disconnected,
        2 => {
            let len = (usize::from(tag >> 3) + 1).min(data.len());
            let (bytes, rest) = data.split_at(len);
            *data = rest;
            LinkEvent::CharacteristicWrite(Packet::from_slice(bytes).ok()?)
        }
        3 => LinkEvent::DeliveryAck {
            success: tag & 0x80 == 0,
        },
        _ => LinkEvent::DescriptorWrite {
            notifications: tag & 0x80 != 0,
        },
    };
    Some(event)
}

fuzz_target!(|data: &[u8]| {
    let mut server = LinkServer::new(LinkConfig::default());
    let mut transport = LoopbackTransport::new();
    let mut payloads = EchoReply::new();
    if server.start(&mut transport, &mut NullSink).is_err() {
        return;
    }

    let mut input = data;
    while let Some(event) = next_event(&mut input) {
        server.handle_event(event, &mut transport, &mut payloads, &mut NullSink);

        let state = server.state();
        assert_eq!(state == StateId::Idle, server.peer().is_none());
        // Notifications only go out while a send is active.
        if transport.pending_notifications() > 0 {
            assert_eq!(state, StateId::SendingData);
        }
        while transport.pop_notification().is_some() {}
    }
});
