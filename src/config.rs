//! Link configuration parameters
//!
//! All tunable parameters for the GATT link.  Values can be overridden
//! from a JSON file or a persisted config blob (see [`ConfigPort`]).
//!
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::protocol::codec::{HEADER_SIZE, PROTOCOL_VERSION};
use crate::protocol::packet::MAX_PACKET_CAPACITY;

/// Default transport packet size: 23-byte ATT MTU minus the 3-byte ATT header.
pub const DEFAULT_MAX_PACKET_SIZE: u16 = 20;

/// What to do with an envelope whose version byte differs from ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Log and accept (forward compatible).
    #[default]
    Lenient,
    /// Abort the transfer with `UnsupportedVersion`.
    Strict,
}

/// What to do with bytes past the declared length in the final packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Drop the surplus and complete the transfer.
    #[default]
    Discard,
    /// Abort the transfer with `PayloadOverrun`.
    Reject,
}

/// Core link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    // --- Transport ---
    /// Largest packet the transport moves in one write/notification
    pub max_packet_size: u16,
    /// Name included in advertising data
    pub device_name: String,

    // --- Framing ---
    /// Version byte written into outbound envelopes
    pub protocol_version: u8,
    /// Handling of inbound envelopes with a foreign version byte
    pub version_policy: VersionPolicy,
    /// Handling of surplus bytes in the final inbound packet
    pub overrun_policy: OverrunPolicy,
    /// Buffer a header that straddles packets instead of rejecting it
    pub split_header: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            device_name: String::from("gattlink"),

            protocol_version: PROTOCOL_VERSION,
            version_policy: VersionPolicy::Lenient,
            overrun_policy: OverrunPolicy::Discard,
            split_header: false,
        }
    }
}

impl LinkConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_packet_size == 0 || self.max_packet_size as usize > MAX_PACKET_CAPACITY {
            return Err(Error::Config("max_packet_size must be 1–512"));
        }
        if !self.split_header && (self.max_packet_size as usize) < HEADER_SIZE {
            return Err(Error::Config(
                "max_packet_size must be >= 3 unless split_header is enabled",
            ));
        }
        if self.device_name.is_empty() || self.device_name.len() > 29 {
            return Err(Error::Config("device_name must be 1–29 bytes"));
        }
        if !self.device_name.is_ascii() {
            return Err(Error::Config("device_name must be ASCII"));
        }
        Ok(())
    }

    /// Packet size as a `usize`, for slicing.
    pub fn packet_size(&self) -> usize {
        self.max_packet_size as usize
    }
}
