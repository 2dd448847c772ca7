//! Port traits — the hexagonal boundary between the session core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LinkServer (domain)
//! ```
//!
//! Driven adapters (GATT stack, payload source, event sinks, storage)
//! implement these traits.  The [`LinkServer`](super::service::LinkServer)
//! consumes them via generics, so the session core never touches a radio.

use crate::config::LinkConfig;
use crate::error::TransportError;
use crate::protocol::packet::Packet;

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain ↔ GATT stack)
// ───────────────────────────────────────────────────────────────

/// The GATT server side of the link.
///
/// Inbound traffic does not flow through this trait: the stack's callbacks
/// become [`LinkEvent`](crate::events::LinkEvent)s pushed to the
/// [`EventQueue`](crate::events::EventQueue).
pub trait GattTransport {
    /// Capability check and service registration.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Advertise the data service so a central can connect.
    fn start_advertising(&mut self) -> Result<(), TransportError>;

    fn stop_advertising(&mut self);

    /// Send one notification on the data characteristic.
    ///
    /// Completion is signalled later by a `DeliveryAck` event.  An `Err`
    /// here means the stack refused the packet outright.
    fn notify(&mut self, packet: &Packet) -> Result<(), TransportError>;

    /// Tear down the service.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Payload port (driven adapter: domain ↔ application content)
// ───────────────────────────────────────────────────────────────

/// Consumer of received payloads and source of replies.  Bytes are opaque.
pub trait PayloadPort {
    /// A complete inbound payload arrived.
    fn on_payload(&mut self, payload: &[u8]);

    /// Bytes to send back, or `None` to stay silent.
    fn next_reply(&mut self) -> Option<Vec<u8>>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / UI)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`SessionEvent`](super::events::SessionEvent)s
/// through this port.  Adapters decide where they go (log, status label,
/// test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::SessionEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists link configuration.
///
/// Implementations MUST call [`LinkConfig::validate`] before persisting and
/// reject invalid values with [`ConfigError::ValidationFailed`].
pub trait ConfigPort {
    /// Load configuration.  Returns [`LinkConfig::default()`] if nothing
    /// has been stored yet.
    fn load(&self) -> Result<LinkConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &LinkConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage.
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<crate::error::Error> for ConfigError {
    fn from(e: crate::error::Error) -> Self {
        match e {
            crate::error::Error::Config(msg) => Self::ValidationFailed(msg),
            _ => Self::Corrupted,
        }
    }
}

impl<P: PayloadPort + ?Sized> PayloadPort for Box<P> {
    fn on_payload(&mut self, payload: &[u8]) {
        (**self).on_payload(payload);
    }

    fn next_reply(&mut self) -> Option<Vec<u8>> {
        (**self).next_reply()
    }
}
