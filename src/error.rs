use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Error taxonomy for the daemon. Call sites match on variant, not on message text,
/// so a protocol error can be logged-and-dropped while a configuration error aborts
/// startup, without string parsing anywhere.
#[derive(Error, Debug)]
pub enum IpfixdError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, IpfixdError>;
