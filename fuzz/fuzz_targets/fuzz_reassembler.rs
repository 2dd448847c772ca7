//! Fuzz target: `InboundReassembler::on_packet`
//!
//! The first byte picks the packet size and policies; the rest is cut
//! into packets and fed in.  The reassembler must never panic, never
//! report more bytes than the declared envelope, and never yield a
//! payload that disagrees with its header.
//!
//! cargo fuzz run fuzz_reassembler

#![no_main]

use gattlink::config::{LinkConfig, OverrunPolicy, VersionPolicy};
use gattlink::protocol::codec::HEADER_SIZE;
use gattlink::protocol::reassembler::{InboundReassembler, ReceiveOutcome};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&knobs, rest)) = data.split_first() else {
        return;
    };
    let packet_size = usize::from(knobs & 0x1F) + 1;
    let config = LinkConfig {
        split_header: knobs & 0x20 != 0,
        version_policy: if knobs & 0x40 != 0 {
            VersionPolicy::Strict
        } else {
            VersionPolicy::Lenient
        },
        overrun_policy: if knobs & 0x80 != 0 {
            OverrunPolicy::Reject
        } else {
            OverrunPolicy::Discard
        },
        ..LinkConfig::default()
    };
    let mut r = InboundReassembler::from_config(&config);

    for packet in rest.chunks(packet_size) {
        match r.on_packet(packet) {
            Ok(ReceiveOutcome::Complete {
                envelope,
                bytes_so_far,
            }) => {
                assert_eq!(bytes_so_far, HEADER_SIZE + envelope.payload().len());
                assert_eq!(usize::from(envelope.length()), envelope.payload().len());
                assert_eq!(r.bytes_so_far(), 0);
            }
            Ok(_) => {
                if let Some(len) = r.expected_length() {
                    assert!(r.bytes_so_far() < HEADER_SIZE + usize::from(len));
                }
            }
            Err(_) => assert_eq!(r.bytes_so_far(), 0),
        }
    }

    // After a reset the reassembler must accept a clean envelope.
    r.reset();
    assert!(matches!(
        r.on_packet(&[1, 0, 0]),
        Ok(ReceiveOutcome::Complete { .. })
    ));
});
