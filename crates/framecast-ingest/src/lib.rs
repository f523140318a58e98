//! Frame ingestion service.
//!
//! This is the "just works" layer. [`FrameReceiver::start`] binds the
//! listening port and runs the [`IngestLoop`] on its own thread; the
//! consumer calls [`tick`] (or [`FrameReceiver::take_latest`]) on its own
//! schedule and only ever sees the newest complete frame.

pub mod config;
pub mod error;
pub mod ingest_loop;
pub mod presenter;
pub mod receiver;
pub mod stats;

pub use config::{DisplayConfig, IngestConfig};
pub use error::{IngestError, Result};
pub use ingest_loop::{IngestLoop, IngestState};
pub use presenter::{tick, PresentError, Presenter};
pub use receiver::FrameReceiver;
pub use stats::IngestStats;
