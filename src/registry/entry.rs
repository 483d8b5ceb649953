//! Subscriber entry
//!
//! One [`Subscriber`] exists per open `subscribe` call. The registry and the
//! dispatcher hold it through a [`SubscriberHandle`]; the receiving halves of
//! its queue and close signal live in a [`Mailbox`] owned by the stream session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use crate::message::Message;
use crate::session::{CloseReason, SessionPhase};
use crate::stats::SubscriberStats;

/// Unique session identifier
pub type SubscriberId = u64;

/// Shared handle to a registered subscriber
pub type SubscriberHandle = Arc<Subscriber>;

/// Result of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Message is queued for delivery
    Enqueued,
    /// Queue was full; the subscriber is now closing as a slow consumer
    Overflow,
    /// Subscriber is no longer accepting messages
    Closed,
}

#[derive(Debug)]
struct Lifecycle {
    phase: SessionPhase,
    reason: Option<CloseReason>,
}

/// A streaming receiver and its bounded delivery queue
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    capacity: usize,
    tx: mpsc::Sender<Arc<Message>>,
    closed_tx: watch::Sender<Option<CloseReason>>,
    lifecycle: Mutex<Lifecycle>,
    enqueued: AtomicU64,
    registered_at: Instant,
}

/// Receiving side of a subscriber's queue and close signal
#[derive(Debug)]
pub struct Mailbox {
    pub(crate) messages: mpsc::Receiver<Arc<Message>>,
    pub(crate) closed: watch::Receiver<Option<CloseReason>>,
}

impl Mailbox {
    /// Take the next queued message without waiting
    pub fn try_take(&mut self) -> Option<Arc<Message>> {
        self.messages.try_recv().ok()
    }
}

impl Subscriber {
    pub(super) fn new(id: SubscriberId, capacity: usize) -> (Self, Mailbox) {
        let capacity = capacity.max(1);
        let (tx, messages) = mpsc::channel(capacity);
        let (closed_tx, closed) = watch::channel(None);

        let subscriber = Self {
            id,
            capacity,
            tx,
            closed_tx,
            lifecycle: Mutex::new(Lifecycle {
                phase: SessionPhase::Open,
                reason: None,
            }),
            enqueued: AtomicU64::new(0),
            registered_at: Instant::now(),
        };

        (subscriber, Mailbox { messages, closed })
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Configured queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages currently waiting in the queue
    pub fn queued(&self) -> usize {
        self.capacity.saturating_sub(self.tx.capacity())
    }

    /// Total messages ever enqueued for this subscriber
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn phase(&self) -> SessionPhase {
        self.lifecycle().phase
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.lifecycle().reason
    }

    pub fn is_open(&self) -> bool {
        self.phase() == SessionPhase::Open
    }

    /// Enqueue without blocking
    ///
    /// The phase check and the enqueue happen under the lifecycle lock, so no
    /// message lands in the queue after the subscriber starts closing.
    pub fn try_enqueue(&self, message: &Arc<Message>) -> EnqueueOutcome {
        let mut lifecycle = self.lifecycle();
        if lifecycle.phase != SessionPhase::Open {
            return EnqueueOutcome::Closed;
        }

        match self.tx.try_send(Arc::clone(message)) {
            Ok(()) => {
                self.enqueued.fetch_add(1, Ordering::Relaxed);
                EnqueueOutcome::Enqueued
            }
            Err(TrySendError::Full(_)) => {
                self.begin_close(&mut lifecycle, CloseReason::SlowConsumer);
                EnqueueOutcome::Overflow
            }
            Err(TrySendError::Closed(_)) => {
                self.begin_close(&mut lifecycle, CloseReason::Disconnected);
                EnqueueOutcome::Closed
            }
        }
    }

    /// Move an open subscriber to `Closing`
    ///
    /// Returns false if it was already closing or closed; the first reason wins.
    pub fn close(&self, reason: CloseReason) -> bool {
        let mut lifecycle = self.lifecycle();
        if lifecycle.phase != SessionPhase::Open {
            return false;
        }
        self.begin_close(&mut lifecycle, reason);
        true
    }

    /// Terminal transition, called once the session stops delivering
    pub(crate) fn mark_closed(&self) {
        let mut lifecycle = self.lifecycle();
        lifecycle.phase = SessionPhase::Closed;
    }

    pub fn stats(&self) -> SubscriberStats {
        SubscriberStats {
            id: self.id,
            phase: self.phase(),
            queued: self.queued(),
            capacity: self.capacity,
            enqueued: self.enqueued(),
            age: self.registered_at.elapsed(),
        }
    }

    fn begin_close(&self, lifecycle: &mut Lifecycle, reason: CloseReason) {
        lifecycle.phase = SessionPhase::Closing;
        lifecycle.reason = Some(reason);
        self.closed_tx.send_replace(Some(reason));
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{validate, RawMessage};

    fn message(body: &str) -> Arc<Message> {
        Arc::new(validate(RawMessage::new("alice", body)).unwrap())
    }

    #[test]
    fn test_enqueue_until_full() {
        let (subscriber, mut mailbox) = Subscriber::new(1, 2);

        assert_eq!(subscriber.try_enqueue(&message("a")), EnqueueOutcome::Enqueued);
        assert_eq!(subscriber.try_enqueue(&message("b")), EnqueueOutcome::Enqueued);
        assert_eq!(subscriber.queued(), 2);

        assert_eq!(subscriber.try_enqueue(&message("c")), EnqueueOutcome::Overflow);
        assert_eq!(subscriber.phase(), SessionPhase::Closing);
        assert_eq!(subscriber.close_reason(), Some(CloseReason::SlowConsumer));
        assert_eq!(*mailbox.closed.borrow(), Some(CloseReason::SlowConsumer));

        // Closing subscribers take nothing more, even after draining
        assert_eq!(mailbox.try_take().unwrap().body(), "a");
        assert_eq!(subscriber.try_enqueue(&message("d")), EnqueueOutcome::Closed);
        assert_eq!(mailbox.try_take().unwrap().body(), "b");
        assert!(mailbox.try_take().is_none());
        assert_eq!(subscriber.enqueued(), 2);
    }

    #[test]
    fn test_enqueue_after_mailbox_dropped() {
        let (subscriber, mailbox) = Subscriber::new(1, 4);
        drop(mailbox);

        assert_eq!(subscriber.try_enqueue(&message("a")), EnqueueOutcome::Closed);
        assert_eq!(subscriber.close_reason(), Some(CloseReason::Disconnected));
    }

    #[test]
    fn test_first_close_reason_wins() {
        let (subscriber, _mailbox) = Subscriber::new(7, 4);

        assert!(subscriber.close(CloseReason::Shutdown));
        assert!(!subscriber.close(CloseReason::Unsubscribed));
        assert_eq!(subscriber.close_reason(), Some(CloseReason::Shutdown));

        subscriber.mark_closed();
        assert_eq!(subscriber.phase(), SessionPhase::Closed);
    }

    #[test]
    fn test_stats() {
        let (subscriber, _mailbox) = Subscriber::new(3, 8);
        subscriber.try_enqueue(&message("a"));

        let stats = subscriber.stats();
        assert_eq!(stats.id, 3);
        assert_eq!(stats.phase, SessionPhase::Open);
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.capacity, 8);
        assert_eq!(stats.enqueued, 1);
    }
}
