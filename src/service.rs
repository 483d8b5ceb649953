//! Service boundary
//!
//! [`ChatService`] is the surface a transport adapter consumes: a unary
//! `send` and a server-streaming `subscribe`. [`Broker`] implements it on top
//! of the registry, dispatcher and stream sessions.

use std::fmt;
use std::sync::Arc;

use crate::config::BrokerConfig;
use crate::dispatch::{Dispatcher, PublishReceipt};
use crate::message::{validate_with, Message, MessageKind, RawMessage, ValidationError};
use crate::registry::{RegistryError, SubscriberRegistry};
use crate::session::StreamSession;
use crate::stats::{BrokerMetrics, BrokerStats};

/// The chat service operations
pub trait ChatService: Send + Sync + 'static {
    /// Validate and publish one message
    ///
    /// Returns once fan-out has been initiated, not once every subscriber has
    /// received the message.
    fn send(&self, message: RawMessage) -> Result<PublishReceipt, ServiceError>;

    /// Open an independent stream session; no earlier messages are replayed
    fn subscribe(&self) -> Result<StreamSession, ServiceError>;

    /// Terminate every open stream with a shutdown error and refuse new calls
    fn shutdown(&self);
}

/// Errors reported synchronously by the service boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Message failed validation; nothing was published
    Validation(ValidationError),
    /// Subscriber limit reached
    Capacity { max: usize },
    /// Broker has shut down
    Shutdown,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(e) => write!(f, "Invalid message: {}", e),
            ServiceError::Capacity { max } => write!(f, "Subscriber limit reached ({} max)", max),
            ServiceError::Shutdown => write!(f, "Broker is shut down"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::Validation(e)
    }
}

impl From<RegistryError> for ServiceError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::CapacityExceeded { max } => ServiceError::Capacity { max },
            RegistryError::ShutDown => ServiceError::Shutdown,
        }
    }
}

/// In-process chat broker
#[derive(Debug)]
pub struct Broker {
    config: BrokerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Broker {
    /// Create a broker with default configuration
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Create a broker with custom configuration
    pub fn with_config(config: BrokerConfig) -> Self {
        let registry = Arc::new(SubscriberRegistry::with_config(config.registry.clone()));
        let metrics = Arc::new(BrokerMetrics::new());

        Self {
            config,
            dispatcher: Arc::new(Dispatcher::new(registry, metrics)),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        self.dispatcher.registry()
    }

    pub fn is_shut_down(&self) -> bool {
        self.registry().is_shut_down()
    }

    /// Broker-wide statistics snapshot
    pub fn stats(&self) -> BrokerStats {
        self.dispatcher.metrics().snapshot(self.registry().len())
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatService for Broker {
    fn send(&self, message: RawMessage) -> Result<PublishReceipt, ServiceError> {
        let message = validate_with(message, &self.config.limits).map_err(|e| {
            self.dispatcher.metrics().record_rejected();
            tracing::debug!(error = %e, "Message rejected");
            e
        })?;

        if self.is_shut_down() {
            return Err(ServiceError::Shutdown);
        }

        Ok(self.dispatcher.publish(message))
    }

    fn subscribe(&self) -> Result<StreamSession, ServiceError> {
        let (handle, mailbox) = self.registry().register()?;
        self.dispatcher.metrics().record_subscription();

        let session = StreamSession::new(
            handle,
            mailbox,
            Arc::clone(&self.dispatcher),
            self.config.announce_presence,
        );

        if self.config.announce_presence {
            self.dispatcher.publish(Message::notice(
                MessageKind::Joined,
                format!("session {} joined", session.id()),
            ));
        }

        Ok(session)
    }

    fn shutdown(&self) {
        let closed = self.registry().shutdown();
        tracing::info!(closed_sessions = closed, "Broker shut down");
    }
}
