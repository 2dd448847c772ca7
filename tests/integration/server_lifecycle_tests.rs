//! Server lifecycle: start, stop, restart, advertising and connection
//! bookkeeping.

use gattlink::app::commands::ServerCommand;
use gattlink::app::events::SessionEvent;
use gattlink::app::service::LinkServer;
use gattlink::config::LinkConfig;
use gattlink::error::{Error, TransportError};
use gattlink::events::LinkEvent;
use gattlink::fsm::StateId;
use gattlink::protocol::profile::{PeerId, Status};

use crate::mock_link::{Harness, MockTransport, RecordingSink, ScriptedPayloads, TransportCall};

#[test]
fn start_opens_and_advertises() {
    let h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    assert!(h.server.is_running());
    assert_eq!(h.server.state(), StateId::Idle);
    assert_eq!(
        h.transport.calls,
        vec![TransportCall::Open, TransportCall::StartAdvertising]
    );
    assert_eq!(h.sink.statuses(), vec![Status::Advertising]);
}

#[test]
fn unavailable_transport_is_reported_not_retried() {
    let cases = [
        (TransportError::NotSupported, "BLE not supported"),
        (TransportError::AdapterUnavailable, "Cannot get Bluetooth Service"),
        (TransportError::Disabled, "Bluetooth disabled"),
    ];
    for (error, message) in cases {
        let mut server = LinkServer::new(LinkConfig::default());
        let mut transport = MockTransport {
            open_error: Some(error),
            ..MockTransport::default()
        };
        let mut sink = RecordingSink::new();

        let result = server.start(&mut transport, &mut sink);
        assert_eq!(result, Err(Error::Transport(error)));
        assert!(!server.is_running());
        assert_eq!(transport.calls, vec![TransportCall::Open]);
        assert_eq!(sink.messages(), vec![message.to_string()]);
        assert_eq!(sink.statuses(), vec![Status::ServerStopped]);
    }
}

#[test]
fn invalid_config_refuses_to_start() {
    for config in [
        LinkConfig {
            max_packet_size: 0,
            ..LinkConfig::default()
        },
        LinkConfig {
            max_packet_size: 513,
            ..LinkConfig::default()
        },
        LinkConfig {
            max_packet_size: 2,
            split_header: false,
            ..LinkConfig::default()
        },
    ] {
        let mut server = LinkServer::new(config);
        let mut transport = MockTransport::default();
        let mut sink = RecordingSink::new();

        let result = server.start(&mut transport, &mut sink);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!server.is_running());
        assert!(transport.calls.is_empty());
        assert_eq!(sink.statuses(), vec![Status::ServerStopped]);
        assert_eq!(sink.messages().len(), 1);
    }
}

#[test]
fn tiny_packets_start_with_split_header() {
    let config = LinkConfig {
        max_packet_size: 2,
        split_header: true,
        ..LinkConfig::default()
    };
    let mut server = LinkServer::new(config);
    let mut transport = MockTransport::default();
    let mut sink = RecordingSink::new();
    assert_eq!(server.start(&mut transport, &mut sink), Ok(()));
    assert!(server.is_running());
}

#[test]
fn advertising_failure_leaves_server_running() {
    let mut server = LinkServer::new(LinkConfig::default());
    let mut transport = MockTransport {
        advertise_error: Some(3),
        ..MockTransport::default()
    };
    let mut sink = RecordingSink::new();

    server.start(&mut transport, &mut sink).unwrap();
    assert!(server.is_running());
    assert_eq!(sink.messages(), vec!["Advertising failure: 3".to_string()]);
    assert!(sink.statuses().is_empty());
}

#[test]
fn connect_records_peer_and_reports() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    let peer = PeerId::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]).with_name("phone");
    h.event(LinkEvent::Connected(peer.clone()));

    assert_eq!(h.server.state(), StateId::Connected);
    assert_eq!(h.server.peer(), Some(&peer));
    assert!(h.sink.contains(&SessionEvent::PeerConnected(peer)));
    assert_eq!(h.sink.statuses().last(), Some(&Status::Connected));
}

#[test]
fn second_connect_is_anomaly() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();
    h.event(LinkEvent::Connected(PeerId::new([9; 6])));
    assert_eq!(h.server.peer().map(|p| p.address), Some([0xC0, 0xFF, 0xEE, 0, 0, 1]));
    assert_eq!(h.server.stats().anomalies, 1);
}

#[test]
fn descriptor_write_toggles_notifications_without_state_change() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();
    assert!(!h.server.notifications_enabled());
    h.sink.clear();

    h.event(LinkEvent::DescriptorWrite {
        notifications: true,
    });
    assert!(h.server.notifications_enabled());
    assert_eq!(h.server.state(), StateId::Connected);
    assert!(h.sink.contains(&SessionEvent::NotificationsChanged(true)));
    assert_eq!(
        h.sink.statuses(),
        vec![Status::EnablingNotifications, Status::Connected]
    );

    h.disconnect();
    assert!(!h.server.notifications_enabled());
}

#[test]
fn disconnect_readvertises() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();
    h.transport.clear();
    h.sink.clear();

    h.disconnect();
    assert_eq!(h.transport.calls, vec![TransportCall::StartAdvertising]);
    assert_eq!(h.sink.statuses(), vec![Status::Disconnected, Status::Advertising]);
}

#[test]
fn stop_closes_transport_and_drops_events() {
    let mut h = Harness::start(
        LinkConfig::default(),
        ScriptedPayloads::replying([vec![0u8; 100]]),
    );
    h.connect();
    h.write(&[1, 0, 0]);
    assert_eq!(h.server.state(), StateId::SendingData);
    h.transport.clear();
    h.sink.clear();

    h.server.stop(&mut h.transport, &mut h.sink);
    assert!(!h.server.is_running());
    assert_eq!(h.server.state(), StateId::Idle);
    assert_eq!(
        h.transport.calls,
        vec![TransportCall::StopAdvertising, TransportCall::Close]
    );
    assert_eq!(h.sink.statuses(), vec![Status::Disconnected, Status::ServerStopped]);

    h.ack(true);
    assert!(h.transport.notifications().is_empty());
}

#[test]
fn restart_command_cycles_transport() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.connect();
    h.transport.clear();

    h.server
        .handle_command(ServerCommand::Restart, &mut h.transport, &mut h.sink)
        .unwrap();
    assert!(h.server.is_running());
    assert_eq!(h.server.state(), StateId::Idle);
    assert_eq!(
        h.transport.calls,
        vec![
            TransportCall::StopAdvertising,
            TransportCall::Close,
            TransportCall::Open,
            TransportCall::StartAdvertising,
        ]
    );
}

#[test]
fn start_twice_is_noop() {
    let mut h = Harness::start(LinkConfig::default(), ScriptedPayloads::silent());
    h.server
        .handle_command(ServerCommand::Start, &mut h.transport, &mut h.sink)
        .unwrap();
    assert_eq!(h.transport.count(&TransportCall::Open), 1);
}
