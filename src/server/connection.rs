//! Per-connection handler
//!
//! Serves unary `Send` requests until the peer either closes or issues
//! `Subscribe`, after which the connection streams one session's messages.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::error::{Error, ProtocolError, Result};
use crate::message::{Message, RawMessage};
use crate::service::ChatService;
use crate::session::{SessionError, StreamSession};
use crate::wire::{Frame, FramedConnection, MessageFrame, StatusCode};

enum StreamEvent {
    Session(Option<std::result::Result<Arc<Message>, SessionError>>),
    Inbound(Result<Option<Frame>>),
}

pub(crate) struct Connection<S: ChatService> {
    id: u64,
    peer_addr: SocketAddr,
    framed: FramedConnection<TcpStream>,
    service: Arc<S>,
    shutdown: watch::Receiver<bool>,
}

impl<S: ChatService> Connection<S> {
    pub(crate) fn new(
        id: u64,
        socket: TcpStream,
        peer_addr: SocketAddr,
        max_frame_size: usize,
        service: Arc<S>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            peer_addr,
            framed: FramedConnection::new(socket, max_frame_size),
            service,
            shutdown,
        }
    }

    pub(crate) async fn run(&mut self) -> Result<()> {
        loop {
            if *self.shutdown.borrow() {
                return Ok(());
            }

            let frame = tokio::select! {
                frame = self.framed.read_frame() => frame,
                _ = self.shutdown.changed() => return Ok(()),
            };

            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::debug!(connection_id = self.id, "Peer closed connection");
                    return Ok(());
                }
                Err(Error::Protocol(e)) => {
                    self.reject(&e).await;
                    return Err(Error::Protocol(e));
                }
                Err(e) => return Err(e),
            };

            match frame {
                Frame::Send { sender, body } => self.handle_send(sender, body).await?,
                Frame::Subscribe => return self.handle_subscribe().await,
                other => {
                    let e = ProtocolError::UnexpectedFrame(other.name());
                    self.reject(&e).await;
                    return Err(Error::Protocol(e));
                }
            }
        }
    }

    async fn handle_send(&mut self, sender: String, body: String) -> Result<()> {
        let reply = match self.service.send(RawMessage::new(sender, body)) {
            Ok(receipt) => Frame::Ack {
                seq: receipt.seq,
                timestamp: receipt.timestamp,
            },
            Err(e) => {
                tracing::debug!(connection_id = self.id, error = %e, "Send rejected");
                Frame::status(StatusCode::from(&e), e.to_string())
            }
        };
        self.framed.write_frame(&reply).await
    }

    async fn handle_subscribe(&mut self) -> Result<()> {
        let mut session = match self.service.subscribe() {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(connection_id = self.id, error = %e, "Subscribe rejected");
                let status = Frame::status(StatusCode::from(&e), e.to_string());
                return self.framed.write_frame(&status).await;
            }
        };

        tracing::info!(
            connection_id = self.id,
            session_id = session.id(),
            peer = %self.peer_addr,
            "Streaming session opened"
        );

        self.framed
            .write_frame(&Frame::Subscribed {
                session_id: session.id(),
            })
            .await?;

        self.stream(&mut session).await
    }

    async fn stream(&mut self, session: &mut StreamSession) -> Result<()> {
        loop {
            let event = tokio::select! {
                item = session.recv() => StreamEvent::Session(item),
                frame = self.framed.read_frame() => StreamEvent::Inbound(frame),
            };

            match event {
                StreamEvent::Session(Some(Ok(message))) => {
                    let frame = Frame::Message(MessageFrame::from(message.as_ref()));
                    match self.framed.write_frame(&frame).await {
                        Ok(()) => {}
                        Err(Error::Protocol(e)) => {
                            // Message does not fit this connection's frame limit
                            tracing::warn!(
                                connection_id = self.id,
                                session_id = session.id(),
                                seq = message.seq(),
                                error = %e,
                                "Cannot stream message"
                            );
                            self.reject(&e).await;
                            return Err(Error::Protocol(e));
                        }
                        Err(e) => return Err(e),
                    }
                }
                StreamEvent::Session(Some(Err(e))) => {
                    let status = Frame::status(StatusCode::from(&e), e.to_string());
                    return self.framed.write_frame(&status).await;
                }
                StreamEvent::Session(None) => {
                    let status = Frame::status(StatusCode::Ok, "stream closed");
                    return self.framed.write_frame(&status).await;
                }
                StreamEvent::Inbound(Ok(Some(frame))) => {
                    tracing::debug!(
                        connection_id = self.id,
                        frame = frame.name(),
                        "Ignoring frame on streaming connection"
                    );
                }
                StreamEvent::Inbound(Ok(None)) => {
                    tracing::debug!(
                        connection_id = self.id,
                        session_id = session.id(),
                        "Subscriber disconnected"
                    );
                    return Ok(());
                }
                StreamEvent::Inbound(Err(e)) => return Err(e),
            }
        }
    }

    /// Best-effort protocol status before dropping a misbehaving peer
    async fn reject(&mut self, e: &ProtocolError) {
        let status = Frame::status(StatusCode::Protocol, e.to_string());
        if let Err(write_err) = self.framed.write_frame(&status).await {
            tracing::debug!(connection_id = self.id, error = %write_err, "Failed to send status");
        }
    }
}
