//! Inbound commands to the link server.
//!
//! These represent operator actions (menu, CLI, supervisor task) that the
//! [`LinkServer`](super::service::LinkServer) interprets and acts upon.

/// Lifecycle commands for the GATT server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCommand {
    /// Open the transport and start advertising.
    Start,

    /// Stop advertising, close the transport and drop every buffer.
    Stop,

    /// Stop if running, then start again.
    Restart,
}
