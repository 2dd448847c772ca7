//! Unified error types for the link layer.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! session and server report faults uniformly to the observer.  All
//! variants are `Copy` so they can be stored in session events and
//! counters without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Envelope or packet framing failed.
    Codec(CodecError),
    /// A transfer was rejected, aborted or arrived out of order.
    Transfer(TransferError),
    /// The underlying GATT transport failed or is missing.
    Transport(TransportError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl Error {
    /// `true` for the "transport unavailable" class that prevents a server start.
    pub fn is_transport_unavailable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_unavailable())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Transfer(e) => write!(f, "transfer: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Payload does not fit the 16-bit length field.
    PayloadTooLarge { len: usize },
    /// Fewer than the 3 header bytes were available.
    IncompleteHeader { len: usize },
    /// Version byte rejected under the strict version policy.
    UnsupportedVersion(u8),
    /// A packet must carry at least one byte.
    EmptyPacket,
    /// A packet exceeds the ATT attribute limit.
    PacketTooLarge { len: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge { len } => write!(f, "payload of {len} bytes exceeds 65535"),
            Self::IncompleteHeader { len } => write!(f, "incomplete header ({len} of 3 bytes)"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported protocol version {v}"),
            Self::EmptyPacket => write!(f, "empty packet"),
            Self::PacketTooLarge { len } => write!(f, "packet of {len} bytes exceeds 512"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Transfer errors
// ---------------------------------------------------------------------------

/// Protocol-level faults.  The first group aborts a transfer; the ordering
/// group (`WriteWhileSending` onwards) is reported as an anomaly and leaves
/// the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferError {
    /// First packet of a transfer could not hold the header.
    HeaderTooShort { len: usize },
    /// Final packet carried bytes beyond the declared length (reject policy).
    PayloadOverrun { surplus: usize },
    /// `begin` was called while a send was still queued.
    SendAlreadyInProgress,
    /// A delivery ack arrived with nothing in flight.
    NoSendInProgress,
    /// The transport reported a failed notification.
    DeliveryFailure,
    /// A characteristic write arrived while a reply was being sent.
    WriteWhileSending,
    /// A delivery ack arrived while no send was active.
    AckWhileIdle,
    /// Traffic arrived with no peer connected.
    NotConnected,
    /// A second peer connected while one was already attached.
    AlreadyConnected,
}

impl TransferError {
    /// Ordering violations are surfaced but never change state.
    pub fn is_ordering_violation(&self) -> bool {
        matches!(
            self,
            Self::WriteWhileSending | Self::AckWhileIdle | Self::NotConnected | Self::AlreadyConnected
        )
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderTooShort { len } => {
                write!(f, "first packet of {len} bytes cannot hold the header")
            }
            Self::PayloadOverrun { surplus } => {
                write!(f, "{surplus} bytes beyond the declared length")
            }
            Self::SendAlreadyInProgress => write!(f, "send already in progress"),
            Self::NoSendInProgress => write!(f, "no send in progress"),
            Self::DeliveryFailure => write!(f, "notification delivery failed"),
            Self::WriteWhileSending => write!(f, "write received while sending"),
            Self::AckWhileIdle => write!(f, "delivery ack received with no send active"),
            Self::NotConnected => write!(f, "no peer connected"),
            Self::AlreadyConnected => write!(f, "a peer is already connected"),
        }
    }
}

impl From<TransferError> for Error {
    fn from(e: TransferError) -> Self {
        Self::Transfer(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The host has no BLE capability at all.
    NotSupported,
    /// The Bluetooth service or adapter could not be obtained.
    AdapterUnavailable,
    /// The adapter exists but is switched off.
    Disabled,
    /// The advertiser rejected the start request (stack error code).
    AdvertiseFailed(i32),
    /// A notification could not be queued.
    NotifyFailed,
}

impl TransportError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotSupported | Self::AdapterUnavailable | Self::Disabled)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "BLE not supported"),
            Self::AdapterUnavailable => write!(f, "Cannot get Bluetooth Service"),
            Self::Disabled => write!(f, "Bluetooth disabled"),
            Self::AdvertiseFailed(code) => write!(f, "Advertising failure: {code}"),
            Self::NotifyFailed => write!(f, "notification failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
