//! TCP connection setup shared by [`ChatClient`](super::ChatClient) and
//! [`Subscription`](super::Subscription)

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::wire::FramedConnection;

use super::config::ClientConfig;

/// Open a framed connection to the configured server
pub(crate) async fn connect(config: &ClientConfig) -> Result<FramedConnection<TcpStream>> {
    tracing::debug!(addr = %config.server_addr, "Connecting to chat server");

    let socket = timeout(config.connect_timeout, TcpStream::connect(&config.server_addr))
        .await
        .map_err(|_| Error::Timeout)??;

    if config.tcp_nodelay {
        socket.set_nodelay(true)?;
    }

    Ok(FramedConnection::new(socket, config.max_frame_size))
}
