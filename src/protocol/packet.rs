//! Transport packet: one characteristic write or notification.

use core::fmt;
use core::ops::Deref;

use crate::error::CodecError;

/// ATT attribute values are capped at 512 bytes.
pub const MAX_PACKET_CAPACITY: usize = 512;

/// A bounded, non-empty byte sequence.  Opaque below the codec layer.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    bytes: heapless::Vec<u8, MAX_PACKET_CAPACITY>,
}

impl Packet {
    pub fn from_slice(data: &[u8]) -> Result<Self, CodecError> {
        if data.is_empty() {
            return Err(CodecError::EmptyPacket);
        }
        let bytes = heapless::Vec::from_slice(data)
            .map_err(|()| CodecError::PacketTooLarge { len: data.len() })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = CodecError;

    fn try_from(data: &[u8]) -> Result<Self, CodecError> {
        Self::from_slice(data)
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet({} bytes: {:02x?})", self.bytes.len(), self.bytes.as_slice())
    }
}
