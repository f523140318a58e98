use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (4) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "IMG!" (0x49 0x4D 0x47 0x21).
pub const MAGIC: [u8; 4] = *b"IMG!";

/// Hard upper bound on a payload: 200,000 bytes.
pub const MAX_PAYLOAD: usize = 200_000;

/// One complete, length-validated payload extracted from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The opaque payload (an encoded image).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True if the payload is empty. Frames read off the wire never are.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Consume the frame and return its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.payload
    }
}

/// The length half of a frame header.
///
/// Exists only while a single frame is being parsed or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Declared payload length.
    pub len: u32,
}

impl Header {
    /// Decode the big-endian length field.
    pub fn from_length_bytes(bytes: [u8; 4]) -> Self {
        Self {
            len: u32::from_be_bytes(bytes),
        }
    }

    /// Check `0 < len <= max` and return the length as `usize`.
    pub fn validate(self, max: usize) -> Result<usize> {
        validate_len(self.len as usize, max)
    }

    /// Write magic and length into `dst`.
    pub fn encode(self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_slice(&MAGIC);
        dst.put_u32(self.len);
    }
}

pub(crate) fn validate_len(len: usize, max: usize) -> Result<usize> {
    if len == 0 || len > max {
        return Err(FrameError::ProtocolViolation { len, max });
    }
    Ok(len)
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────┐
/// │ Magic (4B)   │ Length       │ Payload          │
/// │ "IMG!"       │ (4B BE u32)  │ (Length bytes)   │
/// └──────────────┴──────────────┴──────────────────┘
/// ```
///
/// Payloads the receiver would reject (empty or above `max_payload`) are
/// refused here so a sender cannot cost itself its connection.
pub fn encode_frame(payload: &[u8], max_payload: usize, dst: &mut BytesMut) -> Result<()> {
    let max = max_payload.min(u32::MAX as usize);
    let len = validate_len(payload.len(), max)?;
    dst.reserve(HEADER_SIZE + len);
    Header { len: len as u32 }.encode(dst);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 200,000.
    pub max_payload_size: usize,
    /// Total time to wait for a declared payload to arrive. Default: 100ms.
    pub payload_wait: Duration,
    /// Interval between availability checks while waiting. Default: 1ms.
    pub payload_poll: Duration,
    /// Read timeout applied to the connection. Default: 1s.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking sends.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
            payload_wait: Duration::from_millis(100),
            payload_poll: Duration::from_millis(1),
            read_timeout: Some(Duration::from_secs(1)),
            write_timeout: None,
        }
    }
}
