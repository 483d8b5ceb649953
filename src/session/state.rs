//! Session state machine
//!
//! ```text
//!   Open ──(disconnect | close | eviction | shutdown)──► Closing ──► Closed
//! ```

use std::fmt;

use super::error::SessionError;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Queue accepts enqueues, receiver is being fed
    Open,
    /// No further enqueues; queued messages may still drain
    Closing,
    /// Terminal, removed from the registry
    Closed,
}

impl SessionPhase {
    pub fn is_open(self) -> bool {
        self == SessionPhase::Open
    }
}

/// Why a session left the `Open` phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Explicit close or registry removal
    Unsubscribed,
    /// Receiver went away
    Disconnected,
    /// Queue overflowed
    SlowConsumer,
    /// Broker shut down
    Shutdown,
}

impl CloseReason {
    /// Whether already-queued messages are delivered before terminating
    ///
    /// Only a vanished receiver abandons its queue.
    pub fn drains_queue(self) -> bool {
        !matches!(self, CloseReason::Disconnected)
    }

    /// Terminal error reported on the stream, if any
    pub fn terminal_error(self, capacity: usize) -> Option<SessionError> {
        match self {
            CloseReason::SlowConsumer => Some(SessionError::SlowConsumer { capacity }),
            CloseReason::Shutdown => Some(SessionError::Shutdown),
            CloseReason::Unsubscribed | CloseReason::Disconnected => None,
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CloseReason::Unsubscribed => "unsubscribed",
            CloseReason::Disconnected => "disconnected",
            CloseReason::SlowConsumer => "slow consumer",
            CloseReason::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_predicates() {
        assert!(SessionPhase::Open.is_open());
        assert!(!SessionPhase::Closing.is_open());
        assert!(!SessionPhase::Closed.is_open());
    }

    #[test]
    fn test_terminal_errors() {
        assert_eq!(
            CloseReason::SlowConsumer.terminal_error(16),
            Some(SessionError::SlowConsumer { capacity: 16 })
        );
        assert_eq!(
            CloseReason::Shutdown.terminal_error(16),
            Some(SessionError::Shutdown)
        );
        assert_eq!(CloseReason::Unsubscribed.terminal_error(16), None);
        assert_eq!(CloseReason::Disconnected.terminal_error(16), None);
    }

    #[test]
    fn test_only_disconnect_abandons_queue() {
        assert!(CloseReason::Unsubscribed.drains_queue());
        assert!(CloseReason::SlowConsumer.drains_queue());
        assert!(CloseReason::Shutdown.drains_queue());
        assert!(!CloseReason::Disconnected.drains_queue());
    }
}
