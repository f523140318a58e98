//! Minimal receiver — prints the size of the newest frame about 30 times a second.
//!
//! Run with:
//!   cargo run --example latest-frame
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:6002 picture.jpg --repeat 100

use std::time::Duration;

use framecast::frame::Frame;
use framecast::ingest::{tick, FrameReceiver, IngestConfig, PresentError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let receiver = FrameReceiver::start(IngestConfig::default())?;
    eprintln!("Listening on {}", receiver.local_addr());

    let mut presenter = |frame: &Frame| -> Result<(), PresentError> {
        eprintln!("Latest frame: {} bytes", frame.len());
        Ok(())
    };

    for _ in 0..300 {
        tick(receiver.channel(), &mut presenter);
        std::thread::sleep(Duration::from_millis(33));
    }

    let stats = receiver.shutdown()?;
    eprintln!(
        "Done: {} frames published, {} overwritten",
        stats.frames_published, stats.frames_overwritten
    );
    Ok(())
}
