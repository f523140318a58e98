//! Single-slot latest-wins handoff between the ingest thread and a consumer.

use parking_lot::Mutex;

use crate::codec::Frame;

/// A one-frame mailbox where every publish replaces what was there.
///
/// The lock is held only for the swap itself, never across I/O, so neither
/// side can stall the other. A frame that is overwritten before it is taken
/// is dropped; a taken frame is gone from the slot and cannot be delivered
/// twice.
#[derive(Debug, Default)]
pub struct FrameChannel {
    slot: Mutex<Option<Frame>>,
}

impl FrameChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot contents with `frame`.
    ///
    /// Returns `true` if an unconsumed frame was discarded.
    pub fn publish(&self, frame: Frame) -> bool {
        self.slot.lock().replace(frame).is_some()
    }

    /// Take the pending frame, leaving the slot empty.
    ///
    /// Returns `None` when nothing new arrived since the last take.
    pub fn take_latest(&self) -> Option<Frame> {
        self.slot.lock().take()
    }

    /// True if a frame is waiting to be taken.
    pub fn has_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}
