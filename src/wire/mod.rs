//! Wire protocol for the TCP adapter
//!
//! A connection carries any number of unary `Send` → `Ack`/`Status`
//! exchanges. A `Subscribe` switches it to streaming: the server answers with
//! `Subscribed`, then `Message` frames, and ends with a terminal `Status`.
//!
//! ```text
//! Client                                   Server
//!   |------- Send{sender, body} ----------->|
//!   |<------ Ack{seq, timestamp} -----------|
//!   |                                        |
//!   |------- Subscribe -------------------->|
//!   |<------ Subscribed{session_id} --------|
//!   |<------ Message ... -------------------|
//!   |<------ Status{code, detail} ----------|
//! ```

pub mod codec;
pub mod frame;
pub mod framed;

pub use codec::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
pub use frame::{Frame, MessageFrame, StatusCode};
pub use framed::FramedConnection;
