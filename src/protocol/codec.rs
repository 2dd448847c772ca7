//! Length-prefix envelope codec.
//!
//! Wire format:
//! ```text
//! ┌─────────┬──────────────┬──────────────────────┐
//! │ Version │ Length (2B)  │ Payload (Length B)   │
//! │ (1B)    │ BE u16       │                      │
//! └─────────┴──────────────┴──────────────────────┘
//! ```
//!
//! Stateless: both the chunker and the reassembler call into it.

use crate::error::CodecError;

/// Version byte written by this implementation.
pub const PROTOCOL_VERSION: u8 = 1;

/// Header size: version byte + 16-bit length.
pub const HEADER_SIZE: usize = 3;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Decoded envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub length: u16,
}

impl Header {
    /// Total encoded size of the envelope this header describes.
    pub fn envelope_len(&self) -> usize {
        HEADER_SIZE + self.length as usize
    }
}

/// The logical message unit.  Immutable once built; `length` is always
/// derived from the payload so the two cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: u8,
    payload: Vec<u8>,
}

impl Envelope {
    /// Wrap `payload` with the current protocol version.
    pub fn new(payload: Vec<u8>) -> Result<Self, CodecError> {
        Self::with_version(PROTOCOL_VERSION, payload)
    }

    pub fn with_version(version: u8, payload: Vec<u8>) -> Result<Self, CodecError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CodecError::PayloadTooLarge { len: payload.len() });
        }
        Ok(Self { version, payload })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn length(&self) -> u16 {
        self.payload.len() as u16
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Give up the envelope and keep the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Encoded size on the wire.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// `version ++ length_hi ++ length_lo ++ payload`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.version);
        out.extend_from_slice(&self.length().to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Encode a payload into envelope bytes with the current protocol version.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    Ok(Envelope::new(payload.to_vec())?.to_bytes())
}

/// Parse the 3-byte header at the front of `bytes`.
///
/// The version byte is returned as-is; policy on unknown versions is the
/// caller's business.
pub fn decode_header(bytes: &[u8]) -> Result<Header, CodecError> {
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::IncompleteHeader { len: bytes.len() });
    }
    Ok(Header {
        version: bytes[0],
        length: u16::from_be_bytes([bytes[1], bytes[2]]),
    })
}
