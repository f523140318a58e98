//! Length-prefixed image framing and the latest-wins frame handoff.
//!
//! Every frame on the wire is:
//! - The 4-byte ASCII magic `IMG!`
//! - A 4-byte big-endian payload length in `(0, 200_000]`
//! - The opaque payload (typically an encoded image)
//!
//! There is no resynchronization: any framing fault means the whole
//! connection is dropped. Decoded frames are handed to the consumer
//! through a single-slot [`FrameChannel`] where the newest frame wins.

pub mod channel;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use channel::FrameChannel;
pub use codec::{encode_frame, Frame, FrameConfig, Header, HEADER_SIZE, MAGIC, MAX_PAYLOAD};
pub use error::{FrameError, FramingFault, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
