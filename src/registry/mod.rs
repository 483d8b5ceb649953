//! Subscriber registry
//!
//! The registry tracks every open `subscribe` call and its bounded delivery
//! queue. The dispatcher fans messages out over a snapshot of it.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<SubscriberRegistry>
//!                  ┌──────────────────────────────┐
//!                  │ RwLock<BTreeMap<Id,          │
//!                  │   Arc<Subscriber> {          │
//!                  │     tx: mpsc::Sender,        │
//!                  │     closed: watch::Sender,   │
//!                  │   }                          │
//!                  │ >>                           │
//!                  └──────────────┬───────────────┘
//!                                 │ snapshot()
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!    try_enqueue()           try_enqueue()           try_enqueue()
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [StreamSession]         [StreamSession]         [StreamSession]
//!   mailbox.recv()          mailbox.recv()          mailbox.recv()
//! ```
//!
//! Messages are shared as `Arc<Message>`, so fan-out clones a pointer per
//! subscriber, never the payload.

pub mod config;
pub mod entry;
pub mod error;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{EnqueueOutcome, Mailbox, Subscriber, SubscriberHandle, SubscriberId};
pub use error::RegistryError;
pub use store::SubscriberRegistry;
