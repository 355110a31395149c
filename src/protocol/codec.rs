//! Message framing
//!
//! Frames are length-prefixed so message boundaries are unambiguous on the
//! byte stream:
//!
//! ```text
//! +----------------+-----+------------------------+
//! | payload length | tag | body                   |
//! |   u32 (BE)     | u8  |                        |
//! +----------------+-----+------------------------+
//!
//! tag 0x00 (Text):   body = UTF-8 line
//! tag 0x01 (Record): body = i32 id (BE) + UTF-8 label
//! ```
//!
//! The length covers the tag byte and the body. A frame that exceeds
//! [`MAX_FRAME_SIZE`], carries an unknown tag, or holds malformed UTF-8 is
//! a protocol violation; the connection that sent it is torn down.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::protocol::constants::{
    FRAME_HEADER_LEN, MAX_FRAME_SIZE, MAX_LINE_LEN, TAG_RECORD, TAG_TEXT,
};
use crate::protocol::message::{Message, Record};

/// Error decoding a wire frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Declared payload length exceeds [`MAX_FRAME_SIZE`]
    FrameTooLarge(usize),
    /// Frame tag byte is neither text nor record
    UnknownTag(u8),
    /// Chat line exceeds [`MAX_LINE_LEN`](crate::protocol::constants::MAX_LINE_LEN)
    LineTooLong(usize),
    /// Text line or record label is not valid UTF-8
    InvalidUtf8,
    /// Frame ended before its declared payload did
    Truncated,
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::FrameTooLarge(len) => {
                write!(f, "frame of {} bytes exceeds limit of {}", len, MAX_FRAME_SIZE)
            }
            ProtocolError::UnknownTag(tag) => write!(f, "unknown frame tag 0x{:02X}", tag),
            ProtocolError::LineTooLong(len) => {
                write!(f, "chat line of {} bytes exceeds limit of {}", len, MAX_LINE_LEN)
            }
            ProtocolError::InvalidUtf8 => write!(f, "frame body is not valid UTF-8"),
            ProtocolError::Truncated => write!(f, "truncated frame"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a message into a complete wire frame
pub fn encode(message: &Message) -> Bytes {
    match message {
        Message::Text(line) => {
            let payload_len = 1 + line.len();
            let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload_len);
            buf.put_u32(payload_len as u32);
            buf.put_u8(TAG_TEXT);
            buf.put_slice(line.as_bytes());
            buf.freeze()
        }
        Message::Record(record) => {
            let payload_len = 1 + 4 + record.label.len();
            let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload_len);
            buf.put_u32(payload_len as u32);
            buf.put_u8(TAG_RECORD);
            buf.put_i32(record.id);
            buf.put_slice(record.label.as_bytes());
            buf.freeze()
        }
    }
}

/// Decode one message from the front of `buf`, if a complete frame is there
///
/// Returns `Ok(None)` when more bytes are needed. On success the frame's
/// bytes are consumed from `buf`; on error the buffer contents are
/// unspecified (the connection is torn down anyway).
pub fn decode(buf: &mut BytesMut) -> std::result::Result<Option<Message>, ProtocolError> {
    if buf.len() < FRAME_HEADER_LEN {
        return Ok(None);
    }

    let payload_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

    if payload_len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(payload_len));
    }
    // Payload must at least hold the tag byte
    if payload_len == 0 {
        return Err(ProtocolError::Truncated);
    }
    if buf.len() < FRAME_HEADER_LEN + payload_len {
        return Ok(None);
    }

    buf.advance(FRAME_HEADER_LEN);
    let mut payload = buf.split_to(payload_len).freeze();
    let tag = payload.get_u8();

    match tag {
        TAG_TEXT => {
            let line = std::str::from_utf8(&payload)
                .map_err(|_| ProtocolError::InvalidUtf8)?
                .to_string();
            Ok(Some(Message::Text(line)))
        }
        TAG_RECORD => {
            if payload.remaining() < 4 {
                return Err(ProtocolError::Truncated);
            }
            let id = payload.get_i32();
            let label = std::str::from_utf8(&payload)
                .map_err(|_| ProtocolError::InvalidUtf8)?
                .to_string();
            Ok(Some(Message::Record(Record { id, label })))
        }
        other => Err(ProtocolError::UnknownTag(other)),
    }
}

/// Buffered message reader over the read half of a connection
#[derive(Debug)]
pub struct MessageReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    /// Wrap a read half
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read the next complete message
    ///
    /// Blocks until a full frame is buffered. A clean EOF between frames
    /// yields [`Error::ConnectionClosed`]; an EOF in the middle of a frame
    /// is a truncated-frame protocol violation.
    pub async fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = decode(&mut self.buf)? {
                return Ok(message);
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                return if self.buf.is_empty() {
                    Err(Error::ConnectionClosed)
                } else {
                    Err(ProtocolError::Truncated.into())
                };
            }
        }
    }
}

/// Message writer over the write half of a connection
#[derive(Debug)]
pub struct MessageWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    /// Wrap a write half
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one message as a complete frame and flush it
    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        self.inner.write_all(&encode(message)).await?;
        self.inner.flush().await?;
        Ok(())
    }
}
