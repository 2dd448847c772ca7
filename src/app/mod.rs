//! Application core — session orchestration, zero I/O.
//!
//! [`service::LinkServer`] owns the state machine and both transfer
//! buffers.  All interaction with the GATT stack, the payload source and
//! the observer happens through the **port traits** in [`ports`], keeping
//! this layer fully testable without a radio.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
