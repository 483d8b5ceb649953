//! Frame encoder and decoder
//!
//! Strings are encoded as a u32 big-endian byte length followed by UTF-8.
//! Decoding is incremental: [`FrameCodec::decode`] returns `Ok(None)` until a
//! whole frame is buffered.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::frame::*;
use crate::error::ProtocolError;
use crate::message::MessageKind;

/// Length prefix size
pub const HEADER_LEN: usize = 4;

/// Default maximum frame size (type byte + payload)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Length-prefixed frame codec
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Append one encoded frame to `dst`
    pub fn encode(&self, frame: &Frame, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let start = dst.len();
        dst.put_u32(0); // patched below
        dst.put_u8(frame.frame_type());

        match frame {
            Frame::Send { sender, body } => {
                put_string(dst, sender);
                put_string(dst, body);
            }
            Frame::Subscribe => {}
            Frame::Ack { seq, timestamp } => {
                dst.put_u64(*seq);
                dst.put_u64(*timestamp);
            }
            Frame::Subscribed { session_id } => {
                dst.put_u64(*session_id);
            }
            Frame::Message(message) => {
                dst.put_u64(message.seq);
                dst.put_u64(message.timestamp);
                dst.put_u8(message.kind.as_u8());
                put_string(dst, &message.sender);
                put_string(dst, &message.body);
            }
            Frame::Status { code, detail } => {
                dst.put_u8(code.as_u8());
                put_string(dst, detail);
            }
        }

        let size = dst.len() - start - HEADER_LEN;
        if size > self.max_frame_size {
            dst.truncate(start);
            return Err(ProtocolError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        dst[start..start + HEADER_LEN].copy_from_slice(&(size as u32).to_be_bytes());

        Ok(())
    }

    /// Decode one frame from the front of `src`, if complete
    pub fn decode(&self, src: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let size = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if size == 0 {
            return Err(ProtocolError::EmptyFrame);
        }
        if size > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        if src.len() < HEADER_LEN + size {
            src.reserve(HEADER_LEN + size - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let mut payload = src.split_to(size).freeze();
        let frame_type = payload.get_u8();
        let frame = decode_payload(frame_type, &mut payload)?;

        if payload.has_remaining() {
            return Err(ProtocolError::TrailingBytes(payload.remaining()));
        }

        Ok(Some(frame))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

fn decode_payload(frame_type: u8, buf: &mut Bytes) -> Result<Frame, ProtocolError> {
    match frame_type {
        FRAME_SEND => Ok(Frame::Send {
            sender: get_string(buf)?,
            body: get_string(buf)?,
        }),
        FRAME_SUBSCRIBE => Ok(Frame::Subscribe),
        FRAME_ACK => Ok(Frame::Ack {
            seq: get_u64(buf)?,
            timestamp: get_u64(buf)?,
        }),
        FRAME_SUBSCRIBED => Ok(Frame::Subscribed {
            session_id: get_u64(buf)?,
        }),
        FRAME_MESSAGE => {
            let seq = get_u64(buf)?;
            let timestamp = get_u64(buf)?;
            let kind_byte = get_u8(buf)?;
            let kind = MessageKind::from_u8(kind_byte)
                .ok_or(ProtocolError::UnknownMessageKind(kind_byte))?;
            Ok(Frame::Message(MessageFrame {
                seq,
                timestamp,
                kind,
                sender: get_string(buf)?,
                body: get_string(buf)?,
            }))
        }
        FRAME_STATUS => {
            let code_byte = get_u8(buf)?;
            let code =
                StatusCode::from_u8(code_byte).ok_or(ProtocolError::UnknownStatusCode(code_byte))?;
            Ok(Frame::Status {
                code,
                detail: get_string(buf)?,
            })
        }
        other => Err(ProtocolError::UnknownFrameType(other)),
    }
}

fn put_string(dst: &mut BytesMut, value: &str) {
    dst.put_u32(value.len() as u32);
    dst.put_slice(value.as_bytes());
}

fn get_u8(buf: &mut Bytes) -> Result<u8, ProtocolError> {
    if buf.remaining() < 1 {
        return Err(ProtocolError::Truncated);
    }
    Ok(buf.get_u8())
}

fn get_u64(buf: &mut Bytes) -> Result<u64, ProtocolError> {
    if buf.remaining() < 8 {
        return Err(ProtocolError::Truncated);
    }
    Ok(buf.get_u64())
}

fn get_string(buf: &mut Bytes) -> Result<String, ProtocolError> {
    if buf.remaining() < 4 {
        return Err(ProtocolError::Truncated);
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(ProtocolError::Truncated);
    }
    let raw = buf.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(frame: &Frame) -> BytesMut {
        let mut buf = BytesMut::new();
        FrameCodec::default().encode(frame, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_send_frame_layout() {
        let buf = encoded(&Frame::Send {
            sender: "al".into(),
            body: "hi!".into(),
        });

        // len(4) type(1) str(4+2) str(4+3)
        assert_eq!(
            &buf[..],
            &[
                0, 0, 0, 14, FRAME_SEND, 0, 0, 0, 2, b'a', b'l', 0, 0, 0, 3, b'h', b'i', b'!'
            ]
        );
    }

    #[test]
    fn test_decode_message_frame() {
        let frame = Frame::Message(MessageFrame {
            seq: 42,
            timestamp: 1_700_000_000_000,
            kind: MessageKind::Chat,
            sender: "alice".into(),
            body: "héllo".into(),
        });
        let mut buf = encoded(&frame);

        let decoded = FrameCodec::default().decode(&mut buf).unwrap();
        assert_eq!(decoded, Some(frame));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_then_complete() {
        let codec = FrameCodec::default();
        let full = encoded(&Frame::Subscribed { session_id: 7 });

        let mut buf = BytesMut::from(&full[..5]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 5);

        buf.extend_from_slice(&full[5..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Subscribed { session_id: 7 })
        );
    }

    #[test]
    fn test_decode_two_frames_back_to_back() {
        let codec = FrameCodec::default();
        let mut buf = encoded(&Frame::Subscribe);
        buf.extend_from_slice(&encoded(&Frame::status(StatusCode::Ok, "done")));

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Subscribe));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::status(StatusCode::Ok, "done"))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_oversize_frame_rejected() {
        let codec = FrameCodec::new(16);

        let mut buf = BytesMut::new();
        buf.put_u32(17);
        assert_eq!(
            codec.decode(&mut buf),
            Err(ProtocolError::FrameTooLarge { size: 17, max: 16 })
        );

        let mut out = BytesMut::from(&b"keep"[..]);
        let result = codec.encode(
            &Frame::Send {
                sender: "alice".into(),
                body: "far too long for this codec".into(),
            },
            &mut out,
        );
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
        assert_eq!(&out[..], b"keep");
    }

    #[test]
    fn test_malformed_frames() {
        let codec = FrameCodec::default();

        let mut empty = BytesMut::from(&[0u8, 0, 0, 0][..]);
        assert_eq!(codec.decode(&mut empty), Err(ProtocolError::EmptyFrame));

        let mut unknown = BytesMut::from(&[0u8, 0, 0, 1, 0x7F][..]);
        assert_eq!(
            codec.decode(&mut unknown),
            Err(ProtocolError::UnknownFrameType(0x7F))
        );

        // Ack with only 4 of 16 payload bytes
        let mut truncated = BytesMut::from(&[0u8, 0, 0, 5, FRAME_ACK, 0, 0, 0, 1][..]);
        assert_eq!(codec.decode(&mut truncated), Err(ProtocolError::Truncated));

        let mut trailing = BytesMut::from(&[0u8, 0, 0, 2, FRAME_SUBSCRIBE, 0xAA][..]);
        assert_eq!(codec.decode(&mut trailing), Err(ProtocolError::TrailingBytes(1)));

        let mut bad_utf8 = BytesMut::new();
        bad_utf8.put_u32(1 + 4 + 1 + 4);
        bad_utf8.put_u8(FRAME_SEND);
        bad_utf8.put_u32(1);
        bad_utf8.put_u8(0xFF);
        bad_utf8.put_u32(0);
        assert_eq!(codec.decode(&mut bad_utf8), Err(ProtocolError::InvalidUtf8));
    }
}
