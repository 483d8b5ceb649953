//! Client side of a streaming session

use tokio::net::TcpStream;

use crate::error::{Error, ProtocolError, Result};
use crate::message::Message;
use crate::wire::{Frame, FramedConnection, StatusCode};

use super::chat::ClientState;
use super::config::ClientConfig;
use super::connector;

/// An open message stream
///
/// Yields messages in broker order. A terminal status other than `Ok`
/// (slow consumer, shutdown) is yielded once as [`Error::Status`]; after
/// that, and after a clean end of stream, [`next`](Self::next) returns `None`.
pub struct Subscription {
    session_id: u64,
    framed: Option<FramedConnection<TcpStream>>,
}

impl Subscription {
    pub(crate) async fn open(config: &ClientConfig) -> Result<Self> {
        let mut framed = connector::connect(config).await?;
        framed.write_frame(&Frame::Subscribe).await?;

        let session_id = match framed.read_frame().await? {
            Some(Frame::Subscribed { session_id }) => session_id,
            Some(Frame::Status { code, detail }) => return Err(Error::Status { code, detail }),
            Some(other) => {
                return Err(Error::Protocol(ProtocolError::UnexpectedFrame(other.name())))
            }
            None => return Err(Error::ConnectionClosed),
        };

        tracing::debug!(session_id = session_id, "Subscribed");

        Ok(Self {
            session_id,
            framed: Some(framed),
        })
    }

    /// Server-side session id
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn state(&self) -> ClientState {
        if self.framed.is_some() {
            ClientState::Open
        } else {
            ClientState::Closed
        }
    }

    /// Wait for the next message
    pub async fn next(&mut self) -> Option<Result<Message>> {
        let framed = self.framed.as_mut()?;

        let item = match framed.read_frame().await {
            Ok(Some(Frame::Message(frame))) => return Some(Ok(frame.into_message())),
            Ok(Some(Frame::Status {
                code: StatusCode::Ok,
                ..
            })) => None,
            Ok(Some(Frame::Status { code, detail })) => Some(Err(Error::Status { code, detail })),
            Ok(Some(other)) => Some(Err(Error::Protocol(ProtocolError::UnexpectedFrame(
                other.name(),
            )))),
            Ok(None) => Some(Err(Error::ConnectionClosed)),
            Err(e) => Some(Err(e)),
        };

        // Stream is over
        self.framed = None;
        item
    }

    /// Stop receiving; the server unregisters the session when it sees EOF
    pub async fn close(&mut self) -> Result<()> {
        match self.framed.take() {
            Some(mut framed) => {
                tracing::debug!(session_id = self.session_id, "Closing subscription");
                framed.shutdown().await
            }
            None => Ok(()),
        }
    }
}
