//! Registry configuration

/// Default per-subscriber queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Configuration for the subscriber registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Bounded capacity of each subscriber's delivery queue (minimum 1)
    pub queue_capacity: usize,

    /// Maximum concurrent subscribers (0 = unlimited)
    pub max_subscribers: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_subscribers: 0,
        }
    }
}

impl RegistryConfig {
    /// Set the per-subscriber queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the maximum number of concurrent subscribers
    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.max_subscribers = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.max_subscribers, 0);
    }

    #[test]
    fn test_queue_capacity_floor() {
        let config = RegistryConfig::default().queue_capacity(0);

        assert_eq!(config.queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .queue_capacity(4)
            .max_subscribers(10);

        assert_eq!(config.queue_capacity, 4);
        assert_eq!(config.max_subscribers, 10);
    }
}
