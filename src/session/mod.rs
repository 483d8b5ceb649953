//! Stream sessions
//!
//! One session per open `subscribe` call: attach, deliver in FIFO order,
//! detach on disconnect, explicit close, slow-consumer eviction or shutdown.

pub mod error;
pub mod state;
pub mod stream;

pub use error::SessionError;
pub use state::{CloseReason, SessionPhase};
pub use stream::StreamSession;
