use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use framecast_frame::{Frame, FrameChannel};
use tracing::debug;

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::ingest_loop::IngestLoop;
use crate::stats::{IngestStats, StatsCounters};

/// Owns the ingest thread and the consumer end of its frame channel.
///
/// Dropping the receiver shuts it down.
pub struct FrameReceiver {
    channel: Arc<FrameChannel>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<StatsCounters>,
    local_addr: SocketAddr,
    handle: Option<JoinHandle<IngestStats>>,
}

impl FrameReceiver {
    /// Bind the listening port and spawn the ingest loop.
    ///
    /// Fails immediately if the port cannot be bound.
    pub fn start(config: IngestConfig) -> Result<Self> {
        let channel = Arc::new(FrameChannel::new());
        let ingest = IngestLoop::bind(config, Arc::clone(&channel))?;
        let shutdown = ingest.shutdown_flag();
        let stats = ingest.stats_handle();
        let local_addr = ingest.local_addr()?;

        let handle = std::thread::Builder::new()
            .name("framecast-ingest".to_string())
            .spawn(move || ingest.run())
            .map_err(IngestError::Spawn)?;

        Ok(Self {
            channel,
            shutdown,
            stats,
            local_addr,
            handle: Some(handle),
        })
    }

    /// Take the newest frame, if one arrived since the last call.
    pub fn take_latest(&self) -> Option<Frame> {
        self.channel.take_latest()
    }

    /// The channel the ingest loop publishes to.
    pub fn channel(&self) -> &Arc<FrameChannel> {
        &self.channel
    }

    /// Address the listening socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Snapshot of the ingest counters.
    pub fn stats(&self) -> IngestStats {
        self.stats.snapshot()
    }

    /// True until shutdown has been requested or the thread has exited.
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the ingest loop and wait for its thread.
    ///
    /// The listening socket and any open connection are closed before this
    /// returns.
    pub fn shutdown(mut self) -> Result<IngestStats> {
        self.stop()
    }

    fn stop(&mut self) -> Result<IngestStats> {
        self.shutdown.store(true, Ordering::Release);
        match self.handle.take() {
            Some(handle) => {
                debug!("waiting for ingest thread");
                handle.join().map_err(|_| IngestError::ThreadPanicked)
            }
            None => Ok(self.stats.snapshot()),
        }
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl std::fmt::Debug for FrameReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReceiver")
            .field("local_addr", &self.local_addr)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::{Duration, Instant};

    use framecast_frame::{FrameWriter, MAGIC, MAX_PAYLOAD};
    use framecast_transport::connect;

    use super::*;

    fn fast_config() -> IngestConfig {
        IngestConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            accept_poll: Duration::from_millis(5),
            idle_poll: Duration::from_millis(1),
            reconnect_backoff: Duration::from_millis(5),
            ..IngestConfig::default()
        }
    }

    fn wait_for_frame(receiver: &FrameReceiver) -> Frame {
        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            if let Some(frame) = receiver.take_latest() {
                return frame;
            }
            assert!(Instant::now() < deadline, "no frame delivered");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(3);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn hello_then_oversized_then_reconnect() {
        let receiver = FrameReceiver::start(fast_config()).unwrap();
        let addr = receiver.local_addr();

        let mut client = FrameWriter::new(connect(addr).unwrap());
        client.send(b"hello").unwrap();
        assert_eq!(wait_for_frame(&receiver).payload.as_ref(), b"hello");

        let mut oversized = MAGIC.to_vec();
        oversized.extend_from_slice(&600_000u32.to_be_bytes());
        client.get_mut().write_all(&oversized).unwrap();
        wait_until(|| receiver.stats().connections_dropped == 1);
        assert!(receiver.take_latest().is_none());

        let mut next = FrameWriter::new(connect(addr).unwrap());
        next.send(b"world").unwrap();
        assert_eq!(wait_for_frame(&receiver).payload.as_ref(), b"world");

        let stats = receiver.shutdown().unwrap();
        assert_eq!(stats.connections_accepted, 2);
        assert_eq!(stats.frames_published, 2);
    }

    #[test]
    fn payload_delivered_byte_by_byte_is_assembled() {
        let receiver = FrameReceiver::start(fast_config()).unwrap();
        let mut client = connect(receiver.local_addr()).unwrap();

        let payload: Vec<u8> = (0..40u8).collect();
        let mut wire = MAGIC.to_vec();
        wire.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        client.write_all(&wire).unwrap();
        for b in &payload {
            client.write_all(std::slice::from_ref(b)).unwrap();
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(wait_for_frame(&receiver).payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn frames_beyond_receive_buffer_are_delivered() {
        let receiver = FrameReceiver::start(fast_config()).unwrap();
        let mut client = FrameWriter::new(connect(receiver.local_addr()).unwrap());

        for len in [150_000, MAX_PAYLOAD] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
            client.send(&payload).unwrap();
            let frame = wait_for_frame(&receiver);
            assert_eq!(frame.len(), len);
            assert_eq!(frame.payload.as_ref(), payload.as_slice());
        }
        assert!(receiver.take_latest().is_none());

        let stats = receiver.shutdown().unwrap();
        assert_eq!(stats.frames_published, 2);
        assert_eq!(stats.frames_rejected, 0);
        assert_eq!(stats.connections_dropped, 0);
    }

    #[test]
    fn bind_conflict_is_surfaced() {
        let first = FrameReceiver::start(fast_config()).unwrap();
        let config = fast_config().with_bind_addr(first.local_addr());

        let err = FrameReceiver::start(config).unwrap_err();
        assert!(err.is_bind(), "expected bind error, got {err:?}");
    }

    #[test]
    fn shutdown_is_prompt_with_idle_connection() {
        let receiver = FrameReceiver::start(fast_config()).unwrap();
        let _client = connect(receiver.local_addr()).unwrap();
        wait_until(|| receiver.stats().connections_accepted == 1);
        assert!(receiver.is_running());

        let started = Instant::now();
        receiver.shutdown().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn shutdown_closes_listening_socket() {
        let receiver = FrameReceiver::start(fast_config()).unwrap();
        let addr = receiver.local_addr();
        drop(receiver);

        assert!(connect(addr).is_err());
    }
}
