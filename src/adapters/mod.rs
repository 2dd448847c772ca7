//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `config_store` | ConfigPort         | JSON file / in-memory blob   |
//! | `log_sink`     | EventSink          | `log` facade                 |
//! | `loopback`     | GattTransport      | In-process simulated central |
//! | `payload`      | PayloadPort        | Fixed content / echo         |

pub mod config_store;
pub mod log_sink;
pub mod loopback;
pub mod payload;
