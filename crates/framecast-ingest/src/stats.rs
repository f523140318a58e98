use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Sender connections accepted.
    pub connections_accepted: u64,
    /// Connections torn down (bad frame, timeout, or peer gone).
    pub connections_dropped: u64,
    /// Frames handed to the channel.
    pub frames_published: u64,
    /// Published frames that replaced one the consumer never took.
    pub frames_overwritten: u64,
    /// Frame reads that failed and cost the connection.
    pub frames_rejected: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) connections_accepted: AtomicU64,
    pub(crate) connections_dropped: AtomicU64,
    pub(crate) frames_published: AtomicU64,
    pub(crate) frames_overwritten: AtomicU64,
    pub(crate) frames_rejected: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> IngestStats {
        IngestStats {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_dropped: self.connections_dropped.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
        }
    }
}
