//! chat-broker: in-process chat broadcast broker
//!
//! Any caller may publish a message; every currently connected subscriber
//! receives it in publish order. Each subscriber has a bounded queue, and a
//! subscriber that falls behind is evicted instead of slowing the others.
//!
//! # Layers
//!
//! - [`message`]: validation and the stamped [`Message`]
//! - [`registry`]: the live subscriber set and per-subscriber queues
//! - [`dispatch`]: non-blocking fan-out with slow-consumer eviction
//! - [`session`]: the consumer end of one subscription
//! - [`service`]: the [`ChatService`] boundary, implemented by [`Broker`]
//! - [`server`] / [`client`]: a length-prefixed TCP transport ([`wire`])
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chat_broker::{Broker, ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> chat_broker::error::Result<()> {
//!     let broker = Arc::new(Broker::new());
//!     let server = ChatServer::new(ServerConfig::default(), broker);
//!     server.run().await
//! }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod registry;
pub mod server;
pub mod service;
pub mod session;
pub mod stats;
pub mod wire;

pub use client::{ChatClient, ClientConfig, Subscription};
pub use config::BrokerConfig;
pub use dispatch::PublishReceipt;
pub use error::{Error, Result};
pub use message::{Message, MessageKind, RawMessage};
pub use server::{ChatServer, ServerConfig};
pub use service::{Broker, ChatService, ServiceError};
pub use session::{CloseReason, SessionError, StreamSession};
