//! Framed connection over an async byte stream

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::codec::FrameCodec;
use super::frame::Frame;
use crate::error::{Error, Result};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Reads and writes whole frames on a stream
///
/// `read_frame` is cancel safe: partially received bytes stay buffered.
#[derive(Debug)]
pub struct FramedConnection<S> {
    stream: S,
    codec: FrameCodec,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl<S> FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, max_frame_size: usize) -> Self {
        Self {
            stream,
            codec: FrameCodec::new(max_frame_size),
            read_buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
            write_buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
        }
    }

    /// Read the next frame
    ///
    /// Returns `Ok(None)` when the peer closes cleanly between frames.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.read_buf)? {
                return Ok(Some(frame));
            }

            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                return if self.read_buf.is_empty() {
                    Ok(None)
                } else {
                    Err(Error::ConnectionClosed)
                };
            }
        }
    }

    /// Encode and flush one frame
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_buf.clear();
        self.codec.encode(frame, &mut self.write_buf)?;
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Shut down the write half of the stream
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
