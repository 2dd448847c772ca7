//! Inbound reassembler.  Accumulates characteristic writes into an envelope.
//!
//! The first packet of a transfer carries the 3-byte header; every later
//! packet is appended verbatim.  Completion fires as soon as the byte count
//! reaches `3 + declared length`.  There is no timeout: a transfer waits
//! until the bytes arrive or the session is reset.

use log::{debug, warn};

use super::codec::{self, Envelope, HEADER_SIZE, Header, PROTOCOL_VERSION};
use crate::config::{LinkConfig, OverrunPolicy, VersionPolicy};
use crate::error::{CodecError, TransferError};

/// Progress report for one inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Header still incomplete (only with `split_header`).
    NeedHeader,
    /// Header parsed from this packet; payload still outstanding.
    HeaderParsed {
        expected_length: u16,
        bytes_so_far: usize,
    },
    /// Payload bytes outstanding.
    InProgress(usize),
    /// Envelope complete; the reassembler is already reset.
    Complete {
        envelope: Envelope,
        bytes_so_far: usize,
    },
}

/// Accumulator for one inbound transfer.
///
/// `bytes_so_far` counts every byte received, header included, and never
/// exceeds the envelope size.
pub struct InboundReassembler {
    header: Option<Header>,
    received: Vec<u8>,
    expected_version: u8,
    version_policy: VersionPolicy,
    overrun_policy: OverrunPolicy,
    split_header: bool,
}

impl InboundReassembler {
    pub fn new() -> Self {
        Self {
            header: None,
            received: Vec::new(),
            expected_version: PROTOCOL_VERSION,
            version_policy: VersionPolicy::Lenient,
            overrun_policy: OverrunPolicy::Discard,
            split_header: false,
        }
    }

    pub fn from_config(config: &LinkConfig) -> Self {
        Self {
            expected_version: config.protocol_version,
            version_policy: config.version_policy,
            overrun_policy: config.overrun_policy,
            split_header: config.split_header,
            ..Self::new()
        }
    }

    /// Feed one packet.  Any error aborts the transfer and resets the buffer.
    pub fn on_packet(&mut self, data: &[u8]) -> crate::Result<ReceiveOutcome> {
        let outcome = match self.header {
            Some(header) => {
                self.received.extend_from_slice(data);
                self.check_complete(header, false)
            }
            None => self.absorb_header(data),
        };
        if outcome.is_err() {
            self.reset();
        }
        outcome
    }

    /// Discard partial data and wait for a fresh header.
    pub fn reset(&mut self) {
        if !self.received.is_empty() {
            debug!("reassembler: discarding {} buffered bytes", self.received.len());
        }
        self.header = None;
        self.received = Vec::new();
    }

    /// `true` once the first byte of a transfer has arrived.
    pub fn is_active(&self) -> bool {
        !self.received.is_empty()
    }

    pub fn bytes_so_far(&self) -> usize {
        self.received.len()
    }

    /// Declared payload length, once the header is in.
    pub fn expected_length(&self) -> Option<u16> {
        self.header.map(|h| h.length)
    }

    // ── Internal ──────────────────────────────────────────────

    fn absorb_header(&mut self, data: &[u8]) -> crate::Result<ReceiveOutcome> {
        if !self.split_header && self.received.is_empty() && data.len() < HEADER_SIZE {
            return Err(TransferError::HeaderTooShort { len: data.len() }.into());
        }
        self.received.extend_from_slice(data);
        if self.received.len() < HEADER_SIZE {
            return Ok(ReceiveOutcome::NeedHeader);
        }

        let header = codec::decode_header(&self.received)?;
        if header.version != self.expected_version {
            match self.version_policy {
                VersionPolicy::Lenient => warn!(
                    "reassembler: version {} differs from {}, accepting",
                    header.version, self.expected_version
                ),
                VersionPolicy::Strict => {
                    return Err(CodecError::UnsupportedVersion(header.version).into());
                }
            }
        }
        debug!("reassembler: header v{} declares {} bytes", header.version, header.length);
        self.received
            .reserve(header.envelope_len().saturating_sub(self.received.len()));
        self.header = Some(header);
        self.check_complete(header, true)
    }

    fn check_complete(
        &mut self,
        header: Header,
        just_parsed: bool,
    ) -> crate::Result<ReceiveOutcome> {
        let total = header.envelope_len();
        let so_far = self.received.len();

        if so_far < total {
            return Ok(if just_parsed {
                ReceiveOutcome::HeaderParsed {
                    expected_length: header.length,
                    bytes_so_far: so_far,
                }
            } else {
                ReceiveOutcome::InProgress(so_far)
            });
        }

        let surplus = so_far - total;
        if surplus > 0 {
            match self.overrun_policy {
                OverrunPolicy::Discard => {
                    warn!("reassembler: dropping {} bytes past declared length", surplus);
                }
                OverrunPolicy::Reject => {
                    return Err(TransferError::PayloadOverrun { surplus }.into());
                }
            }
        }

        let mut received = core::mem::take(&mut self.received);
        received.truncate(total);
        let payload = received.split_off(HEADER_SIZE);
        let envelope = Envelope::with_version(header.version, payload)?;
        self.header = None;
        Ok(ReceiveOutcome::Complete {
            envelope,
            bytes_so_far: total,
        })
    }
}

impl Default for InboundReassembler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────
