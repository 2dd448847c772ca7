//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the link server against
//! mock adapters.  Everything runs on the host, no radio required.

mod mock_link;
mod server_lifecycle_tests;
mod session_flow_tests;
