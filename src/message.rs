//! Chat message model
//!
//! A [`RawMessage`] is what a publisher hands to `send`. Validation turns it
//! into a [`Message`], stamping the receipt time. The dispatcher then assigns
//! the broker-wide sequence number and shares the message as `Arc<Message>`
//! with every subscriber queue; it is never mutated after that.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Sender name used for broker-generated notices
pub const SYSTEM_SENDER: &str = "system";

/// Default maximum sender length in bytes
pub const DEFAULT_MAX_SENDER_LEN: usize = 256;

/// Default maximum body length in bytes
pub const DEFAULT_MAX_BODY_LEN: usize = 64 * 1024;

/// What a message represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Chat text from a publisher
    Chat,
    /// A subscriber joined
    Joined,
    /// A subscriber left
    Left,
}

impl MessageKind {
    pub fn as_u8(self) -> u8 {
        match self {
            MessageKind::Chat => 0,
            MessageKind::Joined => 1,
            MessageKind::Left => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MessageKind::Chat),
            1 => Some(MessageKind::Joined),
            2 => Some(MessageKind::Left),
            _ => None,
        }
    }
}

/// Unvalidated message as submitted by a publisher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub sender: String,
    pub body: String,
}

impl RawMessage {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }
}

/// A validated chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    sender: String,
    body: String,
    /// Milliseconds since the Unix epoch, assigned at receipt
    timestamp: u64,
    /// Broker-wide dispatch order; 0 until published
    seq: u64,
}

impl Message {
    /// Build a broker notice from the system sender
    pub(crate) fn notice(kind: MessageKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            sender: SYSTEM_SENDER.to_string(),
            body: body.into(),
            timestamp: now_millis(),
            seq: 0,
        }
    }

    /// Rebuild a message that was already published (e.g. decoded off the wire)
    pub fn from_parts(
        seq: u64,
        timestamp: u64,
        kind: MessageKind,
        sender: String,
        body: String,
    ) -> Self {
        Self {
            kind,
            sender,
            body,
            timestamp,
            seq,
        }
    }

    pub(crate) fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MessageKind::Chat => write!(f, "[{}] {}: {}", self.seq, self.sender, self.body),
            MessageKind::Joined | MessageKind::Left => {
                write!(f, "[{}] * {}", self.seq, self.body)
            }
        }
    }
}

/// Size limits applied during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    /// Maximum sender length in bytes
    pub max_sender_len: usize,
    /// Maximum body length in bytes
    pub max_body_len: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            max_sender_len: DEFAULT_MAX_SENDER_LEN,
            max_body_len: DEFAULT_MAX_BODY_LEN,
        }
    }
}

impl MessageLimits {
    pub fn max_sender_len(mut self, len: usize) -> Self {
        self.max_sender_len = len;
        self
    }

    pub fn max_body_len(mut self, len: usize) -> Self {
        self.max_body_len = len;
        self
    }
}

/// Reasons a message is rejected at `send` time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Sender is empty or whitespace
    EmptySender,
    /// Sender exceeds the configured limit
    SenderTooLong { len: usize, max: usize },
    /// Body exceeds the configured limit
    BodyTooLong { len: usize, max: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptySender => write!(f, "Sender must not be empty"),
            ValidationError::SenderTooLong { len, max } => {
                write!(f, "Sender is {} bytes, maximum is {}", len, max)
            }
            ValidationError::BodyTooLong { len, max } => {
                write!(f, "Body is {} bytes, maximum is {}", len, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a raw message with default limits
pub fn validate(raw: RawMessage) -> Result<Message, ValidationError> {
    validate_with(raw, &MessageLimits::default())
}

/// Validate a raw message and stamp its receipt time
pub fn validate_with(raw: RawMessage, limits: &MessageLimits) -> Result<Message, ValidationError> {
    if raw.sender.trim().is_empty() {
        return Err(ValidationError::EmptySender);
    }
    if raw.sender.len() > limits.max_sender_len {
        return Err(ValidationError::SenderTooLong {
            len: raw.sender.len(),
            max: limits.max_sender_len,
        });
    }
    if raw.body.len() > limits.max_body_len {
        return Err(ValidationError::BodyTooLong {
            len: raw.body.len(),
            max: limits.max_body_len,
        });
    }

    Ok(Message {
        kind: MessageKind::Chat,
        sender: raw.sender,
        body: raw.body,
        timestamp: now_millis(),
        seq: 0,
    })
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
