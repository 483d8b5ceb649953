//! Broadcast dispatcher
//!
//! Fans each published message out to a snapshot of the registry with
//! non-blocking enqueues. A full queue evicts that subscriber only; the
//! publisher never waits on a receiver.

use std::sync::{Arc, Mutex, PoisonError};

use crate::message::Message;
use crate::registry::{EnqueueOutcome, SubscriberHandle, SubscriberRegistry};
use crate::stats::BrokerMetrics;

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Sequence number assigned to the message
    pub seq: u64,
    /// Receipt time of the message (ms since the Unix epoch)
    pub timestamp: u64,
    /// Subscribers the message was queued for
    pub recipients: usize,
    /// Subscribers evicted as slow consumers during this pass
    pub evicted: usize,
}

/// Broadcast dispatcher
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<SubscriberRegistry>,
    metrics: Arc<BrokerMetrics>,
    /// Last assigned sequence number. Held for the whole enqueue pass so all
    /// subscribers observe publishes in the same order.
    last_seq: Mutex<u64>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SubscriberRegistry>, metrics: Arc<BrokerMetrics>) -> Self {
        Self {
            registry,
            metrics,
            last_seq: Mutex::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<BrokerMetrics> {
        &self.metrics
    }

    /// Publish a validated message to every current subscriber
    pub fn publish(&self, message: Message) -> PublishReceipt {
        let mut evicted: Vec<SubscriberHandle> = Vec::new();
        let mut gone: Vec<SubscriberHandle> = Vec::new();
        let mut recipients = 0;

        let message = {
            let mut last_seq = self.last_seq.lock().unwrap_or_else(PoisonError::into_inner);
            *last_seq += 1;
            let message = Arc::new(message.with_seq(*last_seq));

            for subscriber in self.registry.snapshot() {
                match subscriber.try_enqueue(&message) {
                    EnqueueOutcome::Enqueued => recipients += 1,
                    EnqueueOutcome::Overflow => evicted.push(subscriber),
                    EnqueueOutcome::Closed => gone.push(subscriber),
                }
            }

            message
        };

        for subscriber in &evicted {
            tracing::warn!(
                session_id = subscriber.id(),
                capacity = subscriber.capacity(),
                seq = message.seq(),
                "Slow consumer evicted"
            );
            self.registry.unregister(subscriber);
        }
        for subscriber in &gone {
            self.registry.unregister(subscriber);
        }

        self.metrics.record_publish(recipients, evicted.len());

        tracing::debug!(
            seq = message.seq(),
            sender = message.sender(),
            recipients = recipients,
            evicted = evicted.len(),
            "Message published"
        );

        PublishReceipt {
            seq: message.seq(),
            timestamp: message.timestamp(),
            recipients,
            evicted: evicted.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{validate, RawMessage};
    use crate::registry::RegistryConfig;
    use crate::session::CloseReason;

    fn dispatcher(config: RegistryConfig) -> Dispatcher {
        Dispatcher::new(
            Arc::new(SubscriberRegistry::with_config(config)),
            Arc::new(BrokerMetrics::new()),
        )
    }

    fn chat(body: &str) -> Message {
        validate(RawMessage::new("alice", body)).unwrap()
    }

    #[test]
    fn test_publish_assigns_increasing_seq() {
        let dispatcher = dispatcher(RegistryConfig::default());

        let first = dispatcher.publish(chat("a"));
        let second = dispatcher.publish(chat("b"));

        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(first.recipients, 0);
    }

    #[test]
    fn test_fifo_per_subscriber() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let (_handle, mut mailbox) = dispatcher.registry().register().unwrap();

        for body in ["one", "two", "three"] {
            dispatcher.publish(chat(body));
        }

        let bodies: Vec<String> = std::iter::from_fn(|| mailbox.try_take())
            .map(|m| m.body().to_string())
            .collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_overflow_evicts_only_slow_subscriber() {
        let dispatcher = dispatcher(RegistryConfig::default().queue_capacity(2));
        let (slow, _slow_mailbox) = dispatcher.registry().register().unwrap();
        let (fast, mut fast_mailbox) = dispatcher.registry().register().unwrap();

        let first = dispatcher.publish(chat("1"));
        fast_mailbox.try_take();
        let second = dispatcher.publish(chat("2"));
        fast_mailbox.try_take();
        let third = dispatcher.publish(chat("3"));

        assert_eq!(first.recipients, 2);
        assert_eq!(second.recipients, 2);
        assert_eq!(third.recipients, 1);
        assert_eq!(third.evicted, 1);

        assert_eq!(slow.close_reason(), Some(CloseReason::SlowConsumer));
        assert!(!dispatcher.registry().contains(slow.id()));
        assert!(dispatcher.registry().contains(fast.id()));
        assert_eq!(fast_mailbox.try_take().unwrap().body(), "3");

        let stats = dispatcher.metrics().snapshot(dispatcher.registry().len());
        assert_eq!(stats.slow_consumer_evictions, 1);
        assert_eq!(stats.deliveries, 5);
    }

    #[test]
    fn test_disconnected_subscriber_is_unregistered() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let (handle, mailbox) = dispatcher.registry().register().unwrap();
        drop(mailbox);

        let receipt = dispatcher.publish(chat("hello"));

        assert_eq!(receipt.recipients, 0);
        assert_eq!(receipt.evicted, 0);
        assert!(!dispatcher.registry().contains(handle.id()));
        assert_eq!(handle.close_reason(), Some(CloseReason::Disconnected));
    }
}
