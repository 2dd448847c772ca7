//! GATT service profile and peer identity.
//!
//! ## GATT Service Layout
//!
//! | Item             | UUID                                   | Perms        |
//! |------------------|----------------------------------------|--------------|
//! | Data Service     | `F000C0E0-0451-4000-B000-000000000000` | Primary      |
//! | Data             | `F000C0E1-0451-4000-B000-000000000000` | Write+Notify |
//! | CCC Descriptor   | `00002902-0000-1000-8000-00805f9b34fb` | Write        |

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const DATA_SERVICE: u128 = 0xF000C0E0_0451_4000_B000_000000000000;
pub const DATA_CHAR: u128 = 0xF000C0E1_0451_4000_B000_000000000000;
pub const CCC_DESCRIPTOR: u128 = 0x00002902_0000_1000_8000_00805f9b34fb;

const MAX_PEER_NAME: usize = 32;

/// Render a 128-bit UUID in the canonical 8-4-4-4-12 form.
pub fn uuid_string(uuid: u128) -> String {
    let b = uuid.to_be_bytes();
    format!(
        "{:02X}{:02X}{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13],
        b[14], b[15]
    )
}

// ───────────────────────────────────────────────────────────────
// Status
// ───────────────────────────────────────────────────────────────

/// Coarse status shown to the operator.  Purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Advertising,
    Connected,
    Disconnected,
    ServerStopped,
    ReceivingData,
    SendingData,
    /// A CCC descriptor write turning notifications on is being applied.
    EnablingNotifications,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advertising => "Advertising",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::ServerStopped => "Server stopped",
            Self::ReceivingData => "Receiving data",
            Self::SendingData => "Sending data",
            Self::EnablingNotifications => "Enabling notifications",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Peer identity
// ───────────────────────────────────────────────────────────────

/// The connected central, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerId {
    pub address: [u8; 6],
    pub name: Option<heapless::String<MAX_PEER_NAME>>,
}

impl PeerId {
    pub fn new(address: [u8; 6]) -> Self {
        Self { address, name: None }
    }

    /// Attach an advertised name; names longer than 32 bytes are truncated
    /// on a character boundary.
    pub fn with_name(mut self, name: &str) -> Self {
        let mut s = heapless::String::new();
        for ch in name.chars() {
            if s.push(ch).is_err() {
                break;
            }
        }
        self.name = Some(s);
        self
    }

    /// Name for display, `"N/A"` when the peer did not report one.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("N/A")
    }

    /// `AA:BB:CC:DD:EE:FF`
    pub fn mac(&self) -> String {
        let a = self.address;
        format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}
