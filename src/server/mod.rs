//! Network server: configuration and the TCP line transport.

pub mod config;
pub mod transport;

pub use config::{load_config, load_from_path, ListenConfig, LoggingConfig, ServerConfig, CONFIG};
pub use transport::{serve_connection, Server, TransportError};
