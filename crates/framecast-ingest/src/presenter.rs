//! The consumer side: draining the channel and handing frames to a renderer.

use framecast_frame::{Frame, FrameChannel};
use tracing::warn;

/// Error type a presenter may return. It is logged and dropped.
pub type PresentError = Box<dyn std::error::Error + Send + Sync>;

/// Something that turns frame bytes into pixels on a surface.
///
/// Decoding and drawing are entirely the presenter's business; failures
/// never reach the ingest loop.
pub trait Presenter {
    /// Decode `frame` and show it.
    fn decode_and_present(&mut self, frame: &Frame) -> Result<(), PresentError>;
}

impl<F> Presenter for F
where
    F: FnMut(&Frame) -> Result<(), PresentError>,
{
    fn decode_and_present(&mut self, frame: &Frame) -> Result<(), PresentError> {
        self(frame)
    }
}

/// One consumer tick: take the newest frame, if any, and present it.
///
/// Returns `true` if a frame was taken, whether or not presenting it
/// succeeded. Never blocks on the ingest thread.
pub fn tick<P: Presenter + ?Sized>(channel: &FrameChannel, presenter: &mut P) -> bool {
    let Some(frame) = channel.take_latest() else {
        return false;
    };
    if let Err(err) = presenter.decode_and_present(&frame) {
        warn!(len = frame.len(), error = %err, "presenter rejected frame");
    }
    true
}
