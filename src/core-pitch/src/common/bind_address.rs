use std::net::{AddrParseError, SocketAddr};
use std::num::ParseIntError;

use crate::common::env::env_or;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "3000";

#[derive(Debug, thiserror::Error)]
pub enum BindAddressError {
    #[error("Invalid PORT '{port}': {source}")]
    Port { port: String, source: ParseIntError },
    #[error("Invalid HOST '{host}': {source}")]
    Host { host: String, source: AddrParseError },
}

/// The socket the server listens on, from HOST and PORT (blank means default).
pub fn bind_address() -> Result<SocketAddr, BindAddressError> {
    parse_bind_address(&env_or("HOST", DEFAULT_HOST), &env_or("PORT", DEFAULT_PORT))
}

pub fn parse_bind_address(host: &str, port: &str) -> Result<SocketAddr, BindAddressError> {
    let port_number = port.parse::<u16>().map_err(|source| BindAddressError::Port {
        port: port.to_string(),
        source,
    })?;
    // Bracket bare IPv6 hosts so `::1` and `[::1]` both work.
    let host_part = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    format!("{}:{}", host_part, port_number)
        .parse::<SocketAddr>()
        .map_err(|source| BindAddressError::Host {
            host: host.to_string(),
            source,
        })
}
