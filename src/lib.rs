//! GattLink: chunked, length-prefixed message transfer over a single GATT
//! write/notify characteristic.
//!
//! Exposes the protocol core, the session state machine and the port
//! adapters for the host binary and for integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod protocol;

pub use error::{Error, Result};
