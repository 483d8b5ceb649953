//! Session error types

/// Terminal errors reported on a subscriber's stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The delivery queue overflowed and the subscriber was evicted
    SlowConsumer { capacity: usize },
    /// The broker shut down
    Shutdown,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::SlowConsumer { capacity } => {
                write!(f, "Slow consumer: delivery queue of {} overflowed", capacity)
            }
            SessionError::Shutdown => write!(f, "Broker is shutting down"),
        }
    }
}

impl std::error::Error for SessionError {}
