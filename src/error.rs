//! Crate error types
//!
//! Errors are scoped per connection: a protocol violation or I/O failure
//! tears down the connection it happened on and nothing else. The only
//! fatal error is a listener bind failure, which surfaces from
//! [`ChatServer::run`](crate::server::ChatServer::run).

use crate::protocol::codec::ProtocolError;

/// Convenience result alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O error (socket read/write/bind)
    Io(std::io::Error),
    /// Malformed or undecodable wire data
    Protocol(ProtocolError),
    /// Peer closed the connection
    ConnectionClosed,
    /// Client-side name negotiation failed
    Negotiation(&'static str),
}

impl Error {
    /// Whether this error means the peer is gone (EOF or reset), as
    /// opposed to the peer sending garbage.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::ConnectionClosed => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            Error::Protocol(_) | Error::Negotiation(_) => false,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol violation: {}", e),
            Error::ConnectionClosed => write!(f, "Connection closed by peer"),
            Error::Negotiation(reason) => write!(f, "Name negotiation failed: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::ConnectionClosed | Error::Negotiation(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::ConnectionClosed
        } else {
            Error::Io(e)
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}
