//! GattLink host binary: one request/reply exchange over the loopback link.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  LoopbackTransport   LogEventSink   JsonConfigFile            │
//! │  (GattTransport)     (EventSink)    (ConfigPort)              │
//! │  StaticReply / EchoReply (PayloadPort)                        │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ───────────────────     │
//! │                                                               │
//! │  ┌───────────────────────────────────────────────────────┐    │
//! │  │            LinkServer (pure logic)                    │    │
//! │  │  FSM · Reassembler · Chunker                          │    │
//! │  └───────────────────────────────────────────────────────┘    │
//! │                                                               │
//! │  SimulatedCentral ──▶ EventQueue ──▶ LinkServer               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `gattlink [--config <path>] [--echo] [request text]` (see `--help`)

#![deny(unused_must_use)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use gattlink::adapters::config_store::JsonConfigFile;
use gattlink::adapters::log_sink::LogEventSink;
use gattlink::adapters::loopback::{self, LoopbackTransport, SimulatedCentral};
use gattlink::adapters::payload::{EchoReply, StaticReply};
use gattlink::app::commands::ServerCommand;
use gattlink::app::ports::{ConfigPort, PayloadPort};
use gattlink::app::service::LinkServer;
use gattlink::config::LinkConfig;
use gattlink::events::EventQueue;
use gattlink::protocol::profile::{self, PeerId};

/// Content served by default, large enough to span several packets.
const DEFAULT_CONTENT: &str = "GattLink sample document.\n\
     Each reply travels as one length-prefixed envelope, cut into \
     notifications no larger than the negotiated packet size.\n";

#[derive(Parser, Debug)]
#[command(name = "gattlink", version, about, long_about = None)]
struct Args {
    /// JSON config file (defaults to $GATTLINK_CONFIG, then built-in values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reply with the request instead of the sample document
    #[arg(long)]
    echo: bool,

    /// Request text sent by the simulated central
    #[arg(default_value = "GET")]
    request: Vec<String>,
}

fn load_config(path: Option<&Path>) -> Result<LinkConfig> {
    let store = match path {
        Some(p) => Some(JsonConfigFile::new(p)),
        None => JsonConfigFile::from_env(),
    };
    let Some(store) = store else {
        info!("No config file given, using defaults");
        return Ok(LinkConfig::default());
    };
    store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("GattLink v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let config = load_config(args.config.as_deref())?;
    info!(
        "Service {} / characteristic {}, packet size {}",
        profile::uuid_string(profile::DATA_SERVICE),
        profile::uuid_string(profile::DATA_CHAR),
        config.max_packet_size
    );

    // ── 2. Server on the loopback transport ───────────────────
    let packet_size = config.packet_size();
    let device_name = config.device_name.clone();
    let mut server = LinkServer::new(config);
    let mut transport = LoopbackTransport::new();
    let mut sink = LogEventSink::new();
    server.handle_command(ServerCommand::Start, &mut transport, &mut sink)?;

    // ── 3. One exchange driven through the event queue ────────
    let queue = EventQueue::new();
    let peer = PeerId::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]).with_name("central");
    let mut central = SimulatedCentral::new(peer, packet_size);
    let mut payloads: Box<dyn PayloadPort> = if args.echo {
        Box::new(EchoReply::new())
    } else {
        Box::new(StaticReply::new(DEFAULT_CONTENT))
    };

    let request = args.request.join(" ");
    let reply = loopback::exchange(
        &mut server,
        &mut transport,
        &mut central,
        &mut payloads,
        &mut sink,
        &queue,
        request.as_bytes(),
    )?;

    match reply {
        Some(bytes) => {
            println!("{} replied with {} bytes", device_name, bytes.len());
            println!("{}", String::from_utf8_lossy(&bytes));
        }
        None => warn!("No reply received"),
    }

    let stats = server.stats();
    info!(
        "Stats: rx {} msg / {} B, tx {} msg / {} B, aborted {}, anomalies {}",
        stats.messages_received,
        stats.bytes_received,
        stats.messages_sent,
        stats.bytes_sent,
        stats.transfers_aborted,
        stats.anomalies
    );

    server.handle_command(ServerCommand::Stop, &mut transport, &mut sink)?;
    Ok(())
}
