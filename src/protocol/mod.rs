//! Link protocol — framing, chunking and reassembly.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Link Protocol                           │
//! │                                                              │
//! │  payload ──▶ ┌───────┐  envelope  ┌─────────┐  packets       │
//! │              │ Codec │──────────▶│ Chunker │──────────▶ notify│
//! │              └───────┘           └─────────┘   (one per ack) │
//! │                  ▲                                           │
//! │                  │ header        ┌─────────────┐             │
//! │  write ─────────────────────────▶│ Reassembler │──▶ envelope │
//! │                                  └─────────────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire format: 1-byte version, 2-byte big-endian length, payload.  Packet
//! boundaries carry no framing of their own.

pub mod chunker;
pub mod codec;
pub mod packet;
pub mod profile;
pub mod reassembler;
