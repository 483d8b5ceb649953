//! Client configuration

use std::time::Duration;

use crate::wire::DEFAULT_MAX_FRAME_SIZE;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address (`host:port`)
    pub server_addr: String,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Enable TCP_NODELAY
    pub tcp_nodelay: bool,

    /// Largest accepted frame (type byte + payload)
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: String::from("127.0.0.1:40040"),
            connect_timeout: Duration::from_secs(10),
            tcp_nodelay: true,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given server address
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Default::default()
        }
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    /// Set the maximum frame size
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();

        assert_eq!(config.server_addr, "127.0.0.1:40040");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.tcp_nodelay);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("chat.local:9000")
            .connect_timeout(Duration::from_millis(500))
            .tcp_nodelay(false)
            .max_frame_size(2048);

        assert_eq!(config.server_addr, "chat.local:9000");
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
        assert!(!config.tcp_nodelay);
        assert_eq!(config.max_frame_size, 2048);
    }
}
