//! Unary chat client

use tokio::net::TcpStream;

use crate::error::{Error, ProtocolError, Result};
use crate::wire::{Frame, FramedConnection};

use super::config::ClientConfig;
use super::connector;
use super::subscription::Subscription;

/// Lifecycle of a client object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Open,
    Closed,
}

/// Server acknowledgement of a published message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendAck {
    /// Position in the broker's global order
    pub seq: u64,
    /// Broker-assigned timestamp (ms since epoch)
    pub timestamp: u64,
}

/// Chat client
///
/// # Example
/// ```no_run
/// use chat_broker::client::{ChatClient, ClientConfig};
///
/// # async fn example() -> chat_broker::error::Result<()> {
/// let mut client = ChatClient::connect(ClientConfig::new("127.0.0.1:40040")).await?;
///
/// let mut subscription = client.subscribe().await?;
/// client.send("alice", "hello").await?;
///
/// while let Some(message) = subscription.next().await {
///     println!("{}", message?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChatClient {
    config: ClientConfig,
    framed: Option<FramedConnection<TcpStream>>,
}

impl ChatClient {
    /// Connect to a chat server
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let framed = connector::connect(&config).await?;
        tracing::info!(addr = %config.server_addr, "Connected to chat server");

        Ok(Self {
            config,
            framed: Some(framed),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ClientState {
        if self.framed.is_some() {
            ClientState::Open
        } else {
            ClientState::Closed
        }
    }

    /// Publish one message and wait for the server's acknowledgement
    ///
    /// A rejected message comes back as [`Error::Status`] and leaves the
    /// client usable.
    pub async fn send(&mut self, sender: &str, body: &str) -> Result<SendAck> {
        let framed = self.framed.as_mut().ok_or(Error::NotConnected)?;

        framed
            .write_frame(&Frame::Send {
                sender: sender.to_string(),
                body: body.to_string(),
            })
            .await?;

        match framed.read_frame().await? {
            Some(Frame::Ack { seq, timestamp }) => Ok(SendAck { seq, timestamp }),
            Some(Frame::Status { code, detail }) => Err(Error::Status { code, detail }),
            Some(other) => Err(Error::Protocol(ProtocolError::UnexpectedFrame(other.name()))),
            None => Err(Error::ConnectionClosed),
        }
    }

    /// Open a stream on a new connection to the same server
    ///
    /// The subscription is independent of this client and outlives
    /// [`close`](Self::close).
    pub async fn subscribe(&self) -> Result<Subscription> {
        if self.framed.is_none() {
            return Err(Error::NotConnected);
        }
        Subscription::open(&self.config).await
    }

    /// Close the unary connection
    pub async fn close(&mut self) -> Result<()> {
        match self.framed.take() {
            Some(mut framed) => {
                tracing::debug!(addr = %self.config.server_addr, "Closing chat client");
                framed.shutdown().await
            }
            None => Ok(()),
        }
    }
}
