//! Broker configuration

use crate::message::MessageLimits;
use crate::registry::RegistryConfig;

/// Broker configuration options
#[derive(Debug, Clone, Default)]
pub struct BrokerConfig {
    /// Subscriber registry settings (queue capacity, subscriber limit)
    pub registry: RegistryConfig,

    /// Validation limits for incoming messages
    pub limits: MessageLimits,

    /// Publish join/leave notices from the system sender
    pub announce_presence: bool,
}

impl BrokerConfig {
    /// Set the per-subscriber queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.registry = self.registry.queue_capacity(capacity);
        self
    }

    /// Set the maximum number of concurrent subscribers (0 = unlimited)
    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.registry = self.registry.max_subscribers(max);
        self
    }

    /// Set message validation limits
    pub fn limits(mut self, limits: MessageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Enable join/leave notices
    pub fn announce_presence(mut self, enabled: bool) -> Self {
        self.announce_presence = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::config::DEFAULT_QUEUE_CAPACITY;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();

        assert_eq!(config.registry.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.registry.max_subscribers, 0);
        assert_eq!(config.limits, MessageLimits::default());
        assert!(!config.announce_presence);
    }

    #[test]
    fn test_builder_chaining() {
        let config = BrokerConfig::default()
            .queue_capacity(8)
            .max_subscribers(100)
            .limits(MessageLimits::default().max_body_len(1024))
            .announce_presence(true);

        assert_eq!(config.registry.queue_capacity, 8);
        assert_eq!(config.registry.max_subscribers, 100);
        assert_eq!(config.limits.max_body_len, 1024);
        assert!(config.announce_presence);
    }
}
