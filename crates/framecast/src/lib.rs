//! Receive length-prefixed image frames over TCP and present the latest one.
//!
//! framecast accepts a single sender on a TCP port, reads `IMG!`-framed
//! payloads off it, and hands the newest complete frame to a consumer that
//! runs on its own schedule. Older frames the consumer never took are
//! dropped.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP acceptor, connection liveness, pending-byte probe
//! - [`frame`] — Wire format, frame reader/writer, latest-wins channel
//! - [`ingest`] — Ingest loop, receiver lifecycle, presenter hook

/// Re-export transport types.
pub mod transport {
    pub use framecast_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use framecast_frame::*;
}

/// Re-export ingest types.
pub mod ingest {
    pub use framecast_ingest::*;
}
