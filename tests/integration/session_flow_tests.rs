//! Integration tests for the transport event → FSM → transport pipeline.
//!
//! Every test drives a started [`LinkServer`](gattlink::app::service::LinkServer)
//! with hand-built link events and asserts on what reached the mock
//! transport and the recording sink.

use gattlink::app::events::SessionEvent;
use gattlink::config::{LinkConfig, OverrunPolicy, VersionPolicy};
use gattlink::error::{CodecError, Error, TransferError};
use gattlink::fsm::StateId;
use gattlink::protocol::chunker::split_packets;
use gattlink::protocol::codec;
use gattlink::protocol::profile::Status;

use crate::mock_link::{Harness, ScriptedPayloads, TransportCall};

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Write the whole encoded `request` in `packet_size` chunks.
fn send_request(h: &mut Harness, request: &[u8], packet_size: usize) {
    let encoded = codec::encode(request).unwrap();
    for packet in split_packets(&encoded, packet_size) {
        h.write(&packet);
    }
}

// ── Receive path ──────────────────────────────────────────────

#[test]
fn forty_five_byte_request_reports_progress_per_packet() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();

    let request = payload(45);
    send_request(&mut h, &request, 20);

    assert_eq!(h.sink.receive_progress(), vec![20, 40, 48]);
    assert_eq!(h.payloads.received, vec![request]);
    assert!(h.sink.contains(&SessionEvent::Received { len: 45 }));
    // No reply queued: straight back to Connected.
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.transport.notifications().is_empty());
}

#[test]
fn zero_length_request_completes_on_header() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();
    h.write(&[1, 0, 0]);

    assert_eq!(h.payloads.received, vec![Vec::<u8>::new()]);
    assert_eq!(h.sink.receive_progress(), vec![3]);
    assert_eq!(h.server.state(), StateId::Connected);
}

#[test]
fn short_first_packet_aborts_and_next_transfer_succeeds() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();

    h.write(&[1, 0]);
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.sink.contains(&SessionEvent::TransferAborted(Error::Transfer(
        TransferError::HeaderTooShort { len: 2 }
    ))));

    h.write(&[1, 0, 2, b'o', b'k']);
    assert_eq!(h.payloads.received, vec![b"ok".to_vec()]);
}

#[test]
fn foreign_version_accepted_by_default() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();
    h.write(&[2, 0, 1, 9]);
    assert_eq!(h.payloads.received, vec![vec![9]]);
}

#[test]
fn foreign_version_aborts_under_strict_policy() {
    let config = LinkConfig {
        version_policy: VersionPolicy::Strict,
        ..LinkConfig::default()
    };
    let mut h = Harness::start(config, ScriptedPayloads::silent());
    h.connect();
    h.write(&[2, 0, 1, 9]);

    assert!(h.payloads.received.is_empty());
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.sink.contains(&SessionEvent::TransferAborted(Error::Codec(
        CodecError::UnsupportedVersion(2)
    ))));
}

#[test]
fn surplus_bytes_dropped_by_default() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();
    h.write(&[1, 0, 2, b'a']);
    h.write(&[b'b', b'c']);
    assert_eq!(h.payloads.received, vec![b"ab".to_vec()]);
}

#[test]
fn surplus_bytes_abort_under_reject_policy() {
    let config = LinkConfig {
        overrun_policy: OverrunPolicy::Reject,
        ..LinkConfig::default()
    };
    let mut h = Harness::start(config, ScriptedPayloads::silent());
    h.connect();
    h.write(&[1, 0, 2, b'a']);
    h.write(&[b'b', b'c']);

    assert!(h.payloads.received.is_empty());
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.sink.contains(&SessionEvent::TransferAborted(Error::Transfer(
        TransferError::PayloadOverrun { surplus: 1 }
    ))));
}

#[test]
fn split_header_with_one_byte_packets() {
    let config = LinkConfig {
        max_packet_size: 1,
        split_header: true,
        ..LinkConfig::default()
    };
    let mut h = Harness::start(config, ScriptedPayloads::replying([b"yo".to_vec()]));
    h.connect();
    send_request(&mut h, b"hi", 1);
    assert_eq!(h.payloads.received, vec![b"hi".to_vec()]);

    for _ in 0..5 {
        h.ack(true);
    }
    assert_eq!(h.transport.notified_sizes(), vec![1; 5]);
    assert_eq!(h.transport.notifications().concat(), codec::encode(b"yo").unwrap());
    assert_eq!(h.server.state(), StateId::Connected);
}

// ── Send path ─────────────────────────────────────────────────

#[test]
fn reply_is_released_one_packet_per_ack() {
    let reply = payload(45);
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([reply.clone()]),
    );
    h.connect();
    h.write(&[1, 0, 1, b'?']);

    assert_eq!(h.server.state(), StateId::SendingData);
    assert_eq!(h.transport.notified_sizes(), vec![20]);

    h.ack(true);
    assert_eq!(h.transport.notified_sizes(), vec![20, 20]);
    h.ack(true);
    assert_eq!(h.transport.notified_sizes(), vec![20, 20, 8]);
    assert_eq!(h.server.state(), StateId::SendingData);

    h.ack(true);
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.sink.contains(&SessionEvent::Sent { bytes: 48 }));
    assert_eq!(
        h.transport.notifications().concat(),
        codec::encode(&reply).unwrap()
    );
}

#[test]
fn back_to_back_transfers_share_no_state() {
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([b"one".to_vec(), b"two".to_vec()]),
    );
    h.connect();

    for request in [&b"first"[..], &b"second"[..]] {
        h.sink.clear();
        send_request(&mut h, request, 20);
        assert_eq!(h.sink.receive_progress(), vec![request.len() + 3]);
        h.ack(true);
        assert_eq!(h.server.state(), StateId::Connected);
    }

    assert_eq!(
        h.payloads.received,
        vec![b"first".to_vec(), b"second".to_vec()]
    );
    assert_eq!(
        h.transport.notifications(),
        vec![codec::encode(b"one").unwrap(), codec::encode(b"two").unwrap()]
    );
    let stats = h.server.stats();
    assert_eq!(stats.messages_received, 2);
    assert_eq!(stats.messages_sent, 2);
    assert_eq!(stats.bytes_sent, 12);
}

#[test]
fn two_delivery_failures_never_resend() {
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([payload(100)]),
    );
    h.connect();
    h.write(&[1, 0, 0]);
    assert_eq!(h.transport.notified_sizes(), vec![20]);

    h.ack(false);
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.sink.contains(&SessionEvent::TransferAborted(
        TransferError::DeliveryFailure.into()
    )));

    h.ack(false);
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.sink.contains(&SessionEvent::Anomaly(TransferError::AckWhileIdle.into())));
    assert_eq!(h.transport.notified_sizes(), vec![20]);
    assert_eq!(h.server.stats().transfers_aborted, 1);
}

#[test]
fn refused_notification_abandons_send() {
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([payload(60)]),
    );
    h.transport.fail_notify = true;
    h.connect();
    h.write(&[1, 0, 0]);

    assert_eq!(h.server.state(), StateId::Connected);
    assert_eq!(h.transport.notified_sizes(), vec![20]);
    assert!(h.sink.contains(&SessionEvent::TransferAborted(
        TransferError::DeliveryFailure.into()
    )));
}

#[test]
fn oversized_reply_is_rejected_before_any_traffic() {
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([vec![0u8; 65_536]]),
    );
    h.connect();
    h.write(&[1, 0, 0]);

    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.transport.notifications().is_empty());
    assert!(h.sink.contains(&SessionEvent::TransferAborted(Error::Codec(
        CodecError::PayloadTooLarge { len: 65_536 }
    ))));
}

#[test]
fn write_while_sending_is_ignored() {
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([payload(60)]),
    );
    h.connect();
    h.write(&[1, 0, 0]);

    h.write(&[1, 0, 3, 1, 2, 3]);
    assert_eq!(h.server.state(), StateId::SendingData);
    assert_eq!(h.payloads.received.len(), 1);
    assert!(h.sink.contains(&SessionEvent::Anomaly(
        TransferError::WriteWhileSending.into()
    )));

    h.ack(true);
    assert_eq!(h.transport.notified_sizes(), vec![20, 20]);
}

// ── Disconnects ───────────────────────────────────────────────

#[test]
fn disconnect_mid_receive_discards_partial_data() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();

    let mut first = vec![1, 0, 100];
    first.extend(payload(17));
    h.write(&first);
    assert_eq!(h.server.state(), StateId::ReceivingData);

    h.disconnect();
    assert_eq!(h.server.state(), StateId::Idle);
    assert!(h.server.peer().is_none());
    let statuses = h.sink.statuses();
    assert_eq!(
        &statuses[statuses.len() - 2..],
        &[Status::Disconnected, Status::Advertising]
    );
    assert_eq!(h.transport.count(&TransportCall::StartAdvertising), 2);

    h.sink.clear();
    h.connect();
    h.write(&[1, 0, 2, b'a', b'b']);
    assert_eq!(h.sink.receive_progress(), vec![5]);
    assert_eq!(h.payloads.received, vec![b"ab".to_vec()]);
}

#[test]
fn disconnect_mid_send_drops_queue() {
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([payload(100), payload(100)]),
    );
    h.connect();
    h.write(&[1, 0, 0]);
    h.ack(true);
    assert_eq!(h.transport.notified_sizes(), vec![20, 20]);

    h.disconnect();
    assert_eq!(h.server.state(), StateId::Idle);

    // Late ack from the old link is an anomaly, nothing is sent.
    h.ack(true);
    assert_eq!(h.transport.notified_sizes(), vec![20, 20]);

    h.transport.clear();
    h.connect();
    h.write(&[1, 0, 0]);
    let first = &h.transport.notifications()[0];
    assert_eq!(&first[..3], &[1, 0, 100]);
}

#[test]
fn traffic_before_connect_is_anomaly() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.write(&[1, 0, 0]);
    assert_eq!(h.server.state(), StateId::Idle);
    assert!(h.payloads.received.is_empty());
    assert!(h.sink.contains(&SessionEvent::Anomaly(TransferError::NotConnected.into())));
    assert_eq!(h.server.stats().anomalies, 1);
}
