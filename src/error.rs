//! Error types
//!
//! Each layer owns a small error enum ([`ValidationError`], [`RegistryError`],
//! [`SessionError`], [`ServiceError`], [`ProtocolError`]). [`Error`] is the
//! network-facing error (server, client, wire codec); session errors reach a
//! client as a terminal [`Error::Status`].

use std::fmt;
use std::io;

pub use crate::message::ValidationError;
pub use crate::registry::RegistryError;
pub use crate::service::ServiceError;
pub use crate::session::SessionError;
use crate::wire::StatusCode;

/// Result type for network-facing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Socket I/O failure
    Io(io::Error),
    /// Malformed or unexpected frame
    Protocol(ProtocolError),
    /// Error returned by the service boundary
    Service(ServiceError),
    /// Terminal status received from the remote end
    Status { code: StatusCode, detail: String },
    /// Peer closed the connection mid-exchange
    ConnectionClosed,
    /// Operation did not complete in time
    Timeout,
    /// Client has already been closed
    NotConnected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Service(e) => write!(f, "Service error: {}", e),
            Error::Status { code, detail } => write!(f, "Remote status {:?}: {}", code, detail),
            Error::ConnectionClosed => write!(f, "Connection closed by peer"),
            Error::Timeout => write!(f, "Operation timed out"),
            Error::NotConnected => write!(f, "Not connected"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Service(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        Error::Service(e)
    }
}

/// Wire protocol errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Declared frame length exceeds the configured maximum
    FrameTooLarge { size: usize, max: usize },
    /// Frame length of zero (no type byte)
    EmptyFrame,
    /// Unknown frame type byte
    UnknownFrameType(u8),
    /// Payload ended before a field was complete
    Truncated,
    /// String field is not valid UTF-8
    InvalidUtf8,
    /// Unknown message kind byte
    UnknownMessageKind(u8),
    /// Unknown status code byte
    UnknownStatusCode(u8),
    /// Payload had bytes left over after the last field
    TrailingBytes(usize),
    /// Well-formed frame that is not valid at this point of the exchange
    UnexpectedFrame(&'static str),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::FrameTooLarge { size, max } => {
                write!(f, "Frame of {} bytes exceeds maximum of {}", size, max)
            }
            ProtocolError::EmptyFrame => write!(f, "Empty frame"),
            ProtocolError::UnknownFrameType(t) => write!(f, "Unknown frame type: 0x{:02x}", t),
            ProtocolError::Truncated => write!(f, "Truncated frame payload"),
            ProtocolError::InvalidUtf8 => write!(f, "String field is not valid UTF-8"),
            ProtocolError::UnknownMessageKind(k) => write!(f, "Unknown message kind: {}", k),
            ProtocolError::UnknownStatusCode(c) => write!(f, "Unknown status code: {}", c),
            ProtocolError::TrailingBytes(n) => write!(f, "{} trailing bytes after payload", n),
            ProtocolError::UnexpectedFrame(name) => write!(f, "Unexpected frame: {}", name),
        }
    }
}

impl std::error::Error for ProtocolError {}
