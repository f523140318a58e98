use std::fmt;
use std::time::Duration;

/// Why the frame header could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingFault {
    /// The byte at `position` of the magic did not match.
    BadMagic { position: usize, found: u8 },
    /// The stream ended while reading the magic.
    EndOfStream { position: usize },
    /// The stream ended after `read` bytes of the length field.
    ShortLength { read: usize },
}

impl fmt::Display for FramingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingFault::BadMagic { position, found } => {
                write!(f, "magic mismatch at byte {position} (found 0x{found:02x})")
            }
            FramingFault::EndOfStream { position } => {
                write!(f, "stream ended at magic byte {position}")
            }
            FramingFault::ShortLength { read } => {
                write!(f, "length field truncated after {read} of 4 bytes")
            }
        }
    }
}

/// Errors that can occur during frame encoding/decoding.
///
/// Every variant produced by the reader means the connection must be
/// dropped; there is no partial-frame retry.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header magic was wrong or the header was cut short.
    #[error("framing error: {0}")]
    Framing(FramingFault),

    /// The declared payload length is zero or above the maximum.
    #[error("protocol violation: payload length {len} outside 1..={max}")]
    ProtocolViolation { len: usize, max: usize },

    /// The payload did not fully arrive within the wait budget.
    #[error("timed out after {waited:?} waiting for payload ({received} of {expected} bytes)")]
    Timeout {
        expected: usize,
        received: usize,
        waited: Duration,
    },

    /// The stream ended partway through the payload.
    #[error("incomplete frame: stream ended after {read} of {expected} payload bytes")]
    IncompleteFrame { read: usize, expected: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Short label for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::Framing(_) => "framing",
            FrameError::ProtocolViolation { .. } => "protocol_violation",
            FrameError::Timeout { .. } => "timeout",
            FrameError::IncompleteFrame { .. } => "incomplete_frame",
            FrameError::Io(_) => "io",
        }
    }
}

impl From<framecast_transport::TransportError> for FrameError {
    fn from(err: framecast_transport::TransportError) -> Self {
        use framecast_transport::TransportError;

        match err {
            TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
            TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
                FrameError::Io(source)
            }
            other => FrameError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
