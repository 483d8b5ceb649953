//! Statistics and metrics for the broker and its subscribers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::registry::SubscriberId;
use crate::session::SessionPhase;

/// Per-subscriber statistics
#[derive(Debug, Clone)]
pub struct SubscriberStats {
    /// Session identifier
    pub id: SubscriberId,
    /// Current lifecycle phase
    pub phase: SessionPhase,
    /// Messages waiting in the queue
    pub queued: usize,
    /// Queue capacity
    pub capacity: usize,
    /// Messages ever enqueued
    pub enqueued: u64,
    /// Time since registration
    pub age: Duration,
}

/// Broker-wide statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct BrokerStats {
    /// Currently registered subscribers
    pub active_subscribers: usize,
    /// Subscriptions ever opened
    pub total_subscriptions: u64,
    /// Messages published (chat and notices)
    pub messages_published: u64,
    /// Sends rejected by validation
    pub messages_rejected: u64,
    /// Successful enqueues across all subscribers
    pub deliveries: u64,
    /// Subscribers evicted as slow consumers
    pub slow_consumer_evictions: u64,
    /// Time since the broker was created
    pub uptime: Duration,
}

/// Live counters, updated lock-free from the send and subscribe paths
#[derive(Debug)]
pub struct BrokerMetrics {
    total_subscriptions: AtomicU64,
    messages_published: AtomicU64,
    messages_rejected: AtomicU64,
    deliveries: AtomicU64,
    slow_consumer_evictions: AtomicU64,
    started_at: Instant,
}

impl BrokerMetrics {
    pub fn new() -> Self {
        Self {
            total_subscriptions: AtomicU64::new(0),
            messages_published: AtomicU64::new(0),
            messages_rejected: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            slow_consumer_evictions: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_subscription(&self) {
        self.total_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one fan-out pass
    pub fn record_publish(&self, recipients: usize, evicted: usize) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        self.deliveries
            .fetch_add(recipients as u64, Ordering::Relaxed);
        self.slow_consumer_evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);
    }

    /// Build a snapshot; the active subscriber count comes from the registry
    pub fn snapshot(&self, active_subscribers: usize) -> BrokerStats {
        BrokerStats {
            active_subscribers,
            total_subscriptions: self.total_subscriptions.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            slow_consumer_evictions: self.slow_consumer_evictions.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for BrokerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
