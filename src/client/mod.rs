//! Chat client
//!
//! [`ChatClient`] issues unary sends over one connection. Each
//! [`Subscription`] owns a dedicated connection in streaming mode.

pub mod chat;
pub mod config;
mod connector;
pub mod subscription;

pub use chat::{ChatClient, ClientState, SendAck};
pub use config::ClientConfig;
pub use subscription::Subscription;
