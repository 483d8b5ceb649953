//! Subscriber registry implementation
//!
//! The single shared mutable structure of the broker. Map operations take a
//! short `RwLock`; fan-out works on a cloned snapshot so no lock is held while
//! messages are delivered.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::config::RegistryConfig;
use super::entry::{Mailbox, Subscriber, SubscriberHandle, SubscriberId};
use super::error::RegistryError;
use crate::session::CloseReason;

#[derive(Debug, Default)]
struct Inner {
    subscribers: BTreeMap<SubscriberId, SubscriberHandle>,
    shut_down: bool,
}

/// Registry of active streaming subscribers
#[derive(Debug)]
pub struct SubscriberRegistry {
    inner: RwLock<Inner>,
    next_id: AtomicU64,
    config: RegistryConfig,
}

impl SubscriberRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a new subscriber with an empty bounded queue
    ///
    /// Returns the shared handle and the mailbox the stream session reads from.
    pub fn register(&self) -> Result<(SubscriberHandle, Mailbox), RegistryError> {
        let mut inner = self.write();

        if inner.shut_down {
            return Err(RegistryError::ShutDown);
        }
        let max = self.config.max_subscribers;
        if max > 0 && inner.subscribers.len() >= max {
            tracing::warn!(max = max, "Subscriber rejected: limit reached");
            return Err(RegistryError::CapacityExceeded { max });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (subscriber, mailbox) = Subscriber::new(id, self.config.queue_capacity);
        let handle = Arc::new(subscriber);
        inner.subscribers.insert(id, Arc::clone(&handle));

        tracing::info!(
            session_id = id,
            subscribers = inner.subscribers.len(),
            "Subscriber registered"
        );

        Ok((handle, mailbox))
    }

    /// Remove a subscriber
    ///
    /// Idempotent: returns false if it was already gone. A subscriber that is
    /// still open is closed as `Unsubscribed` so its session terminates.
    pub fn unregister(&self, handle: &SubscriberHandle) -> bool {
        let removed = self.write().subscribers.remove(&handle.id()).is_some();
        handle.close(CloseReason::Unsubscribed);

        if removed {
            tracing::debug!(
                session_id = handle.id(),
                reason = ?handle.close_reason(),
                "Subscriber unregistered"
            );
        }

        removed
    }

    /// Point-in-time view of all subscribers, ordered by id
    pub fn snapshot(&self) -> Vec<SubscriberHandle> {
        self.read().subscribers.values().cloned().collect()
    }

    /// Look up a subscriber by id
    pub fn get(&self, id: SubscriberId) -> Option<SubscriberHandle> {
        self.read().subscribers.get(&id).cloned()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.read().subscribers.contains_key(&id)
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        self.read().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_shut_down(&self) -> bool {
        self.read().shut_down
    }

    /// Close every subscriber with `Shutdown` and refuse new registrations
    ///
    /// Returns the number of subscribers that were closed.
    pub fn shutdown(&self) -> usize {
        let drained = {
            let mut inner = self.write();
            inner.shut_down = true;
            std::mem::take(&mut inner.subscribers)
        };

        let closed = drained
            .values()
            .filter(|subscriber| subscriber.close(CloseReason::Shutdown))
            .count();

        tracing::info!(closed = closed, "Registry shut down");
        closed
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
