//! Frame types
//!
//! ```text
//! ┌──────────────┬─────────┬──────────────────────┐
//! │ length (u32) │ type u8 │ payload              │
//! └──────────────┴─────────┴──────────────────────┘
//!   big endian,    counted in length
//!   excludes itself
//! ```

use crate::message::{Message, MessageKind};
use crate::service::ServiceError;
use crate::session::SessionError;

// Frame type bytes
pub const FRAME_SEND: u8 = 0x01;
pub const FRAME_SUBSCRIBE: u8 = 0x02;
pub const FRAME_ACK: u8 = 0x10;
pub const FRAME_SUBSCRIBED: u8 = 0x11;
pub const FRAME_MESSAGE: u8 = 0x12;
pub const FRAME_STATUS: u8 = 0x13;

/// Status carried by a `Status` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Clean end of stream
    Ok,
    /// Message failed validation
    InvalidArgument,
    /// Subscriber limit reached
    ResourceExhausted,
    /// Subscriber evicted for falling behind
    SlowConsumer,
    /// Broker is shutting down
    Unavailable,
    /// Peer violated the framing protocol
    Protocol,
}

impl StatusCode {
    pub fn as_u8(self) -> u8 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::InvalidArgument => 1,
            StatusCode::ResourceExhausted => 2,
            StatusCode::SlowConsumer => 3,
            StatusCode::Unavailable => 4,
            StatusCode::Protocol => 5,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StatusCode::Ok),
            1 => Some(StatusCode::InvalidArgument),
            2 => Some(StatusCode::ResourceExhausted),
            3 => Some(StatusCode::SlowConsumer),
            4 => Some(StatusCode::Unavailable),
            5 => Some(StatusCode::Protocol),
            _ => None,
        }
    }
}

impl From<&ServiceError> for StatusCode {
    fn from(e: &ServiceError) -> Self {
        match e {
            ServiceError::Validation(_) => StatusCode::InvalidArgument,
            ServiceError::Capacity { .. } => StatusCode::ResourceExhausted,
            ServiceError::Shutdown => StatusCode::Unavailable,
        }
    }
}

impl From<&SessionError> for StatusCode {
    fn from(e: &SessionError) -> Self {
        match e {
            SessionError::SlowConsumer { .. } => StatusCode::SlowConsumer,
            SessionError::Shutdown => StatusCode::Unavailable,
        }
    }
}

/// A delivered chat message on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFrame {
    pub seq: u64,
    pub timestamp: u64,
    pub kind: MessageKind,
    pub sender: String,
    pub body: String,
}

impl From<&Message> for MessageFrame {
    fn from(message: &Message) -> Self {
        Self {
            seq: message.seq(),
            timestamp: message.timestamp(),
            kind: message.kind(),
            sender: message.sender().to_string(),
            body: message.body().to_string(),
        }
    }
}

impl MessageFrame {
    pub fn into_message(self) -> Message {
        Message::from_parts(self.seq, self.timestamp, self.kind, self.sender, self.body)
    }
}

/// A protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Client → server: publish a message
    Send { sender: String, body: String },
    /// Client → server: switch this connection to streaming
    Subscribe,
    /// Server → client: send accepted
    Ack { seq: u64, timestamp: u64 },
    /// Server → client: stream session opened
    Subscribed { session_id: u64 },
    /// Server → client: one streamed message
    Message(MessageFrame),
    /// Server → client: error or end of stream
    Status { code: StatusCode, detail: String },
}

impl Frame {
    /// Status frame helper
    pub fn status(code: StatusCode, detail: impl Into<String>) -> Self {
        Frame::Status {
            code,
            detail: detail.into(),
        }
    }

    /// Type byte written after the length prefix
    pub fn frame_type(&self) -> u8 {
        match self {
            Frame::Send { .. } => FRAME_SEND,
            Frame::Subscribe => FRAME_SUBSCRIBE,
            Frame::Ack { .. } => FRAME_ACK,
            Frame::Subscribed { .. } => FRAME_SUBSCRIBED,
            Frame::Message(_) => FRAME_MESSAGE,
            Frame::Status { .. } => FRAME_STATUS,
        }
    }

    /// Name for logs and protocol errors
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Send { .. } => "Send",
            Frame::Subscribe => "Subscribe",
            Frame::Ack { .. } => "Ack",
            Frame::Subscribed { .. } => "Subscribed",
            Frame::Message(_) => "Message",
            Frame::Status { .. } => "Status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ValidationError;

    #[test]
    fn test_status_code_bytes() {
        for code in [
            StatusCode::Ok,
            StatusCode::InvalidArgument,
            StatusCode::ResourceExhausted,
            StatusCode::SlowConsumer,
            StatusCode::Unavailable,
            StatusCode::Protocol,
        ] {
            assert_eq!(StatusCode::from_u8(code.as_u8()), Some(code));
        }
        assert_eq!(StatusCode::from_u8(0xFF), None);
    }

    #[test]
    fn test_error_status_mapping() {
        let validation = ServiceError::Validation(ValidationError::EmptySender);
        assert_eq!(StatusCode::from(&validation), StatusCode::InvalidArgument);
        assert_eq!(
            StatusCode::from(&ServiceError::Capacity { max: 1 }),
            StatusCode::ResourceExhausted
        );
        assert_eq!(
            StatusCode::from(&SessionError::SlowConsumer { capacity: 4 }),
            StatusCode::SlowConsumer
        );
        assert_eq!(StatusCode::from(&SessionError::Shutdown), StatusCode::Unavailable);
    }
}
