use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use framecast_frame::{FrameChannel, FrameReader, HEADER_SIZE};
use framecast_transport::{is_alive, TcpAcceptor, TcpConnection};
use tracing::{debug, info, trace, warn};

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::stats::{IngestStats, StatsCounters};

/// Where the ingest loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// No sender connected; polling the acceptor.
    NoConnection,
    /// Connected; waiting for at least a header's worth of bytes.
    AwaitingData,
    /// Reading one frame off the connection.
    ReadingFrame,
    /// A connection was just dropped; pausing before accepting again.
    Backoff,
}

/// The network side of the receiver.
///
/// Holds the listening socket and at most one sender connection, reads
/// frames off it and publishes each one to the shared [`FrameChannel`].
/// Any failure on a connection drops it and the loop goes back to
/// accepting; only the shutdown flag ends the loop.
pub struct IngestLoop {
    acceptor: TcpAcceptor,
    reader: Option<FrameReader<TcpConnection>>,
    channel: Arc<FrameChannel>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<StatsCounters>,
    config: IngestConfig,
    state: IngestState,
    partial_since: Option<Instant>,
}

impl IngestLoop {
    /// Bind the listening socket and build a loop that publishes to `channel`.
    ///
    /// A bind failure is returned as-is; callers must not retry it silently.
    pub fn bind(config: IngestConfig, channel: Arc<FrameChannel>) -> Result<Self> {
        let acceptor = TcpAcceptor::bind(config.bind_addr)?;
        Ok(Self::with_acceptor(acceptor, config, channel))
    }

    /// Build a loop around an already bound acceptor.
    pub fn with_acceptor(
        acceptor: TcpAcceptor,
        config: IngestConfig,
        channel: Arc<FrameChannel>,
    ) -> Self {
        Self {
            acceptor,
            reader: None,
            channel,
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(StatsCounters::default()),
            config,
            state: IngestState::NoConnection,
            partial_since: None,
        }
    }

    /// Flag that stops [`IngestLoop::run`] at the top of its next iteration.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Address the listening socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.acceptor.local_addr()?)
    }

    /// Current state of the cycle.
    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Snapshot of the loop's counters.
    pub fn stats(&self) -> IngestStats {
        self.stats.snapshot()
    }

    pub(crate) fn stats_handle(&self) -> Arc<StatsCounters> {
        Arc::clone(&self.stats)
    }

    /// Run until the shutdown flag is raised, then close everything.
    pub fn run(mut self) -> IngestStats {
        info!(addr = ?self.acceptor.local_addr().ok(), "ingest loop started");
        while !self.shutdown.load(Ordering::Acquire) {
            self.step();
        }
        self.close();
        let stats = self.stats.snapshot();
        info!(?stats, "ingest loop stopped");
        stats
    }

    /// Run a single iteration of the cycle.
    ///
    /// Never fails: errors tear the connection down and leave the loop in
    /// [`IngestState::NoConnection`].
    pub fn step(&mut self) -> IngestState {
        let outcome = if self.reader.is_some() {
            self.poll_connection()
        } else {
            self.poll_accept();
            Ok(())
        };

        if let Err(err) = outcome {
            self.teardown(&err);
        }
        self.state
    }

    fn poll_accept(&mut self) {
        self.state = IngestState::NoConnection;
        match self.acceptor.try_accept() {
            Ok(Some(conn)) => {
                let peer = conn.peer_addr();
                match FrameReader::with_config_tcp(conn, self.config.frame.clone()) {
                    Ok(reader) => {
                        info!(?peer, "sender connected");
                        StatsCounters::bump(&self.stats.connections_accepted);
                        self.reader = Some(reader);
                        self.partial_since = None;
                        self.state = IngestState::AwaitingData;
                    }
                    Err(err) => {
                        warn!(?peer, error = %err, "could not configure connection");
                        std::thread::sleep(self.config.accept_poll);
                    }
                }
            }
            Ok(None) => std::thread::sleep(self.config.accept_poll),
            Err(err) => {
                debug!(error = %err, "accept failed; retrying");
                std::thread::sleep(self.config.accept_poll);
            }
        }
    }

    fn poll_connection(&mut self) -> Result<()> {
        let available = match self.reader.as_ref() {
            Some(reader) => reader.available()?,
            None => return Ok(()),
        };

        if available < HEADER_SIZE && !self.partial_header_stalled(available) {
            if !is_alive(self.reader.as_ref().map(FrameReader::get_ref)) {
                return Err(IngestError::ConnectionLost("peer closed connection".into()));
            }
            self.state = IngestState::AwaitingData;
            std::thread::sleep(self.config.idle_poll);
            return Ok(());
        }

        self.state = IngestState::ReadingFrame;
        self.partial_since = None;
        let Some(reader) = self.reader.as_mut() else {
            return Ok(());
        };
        match reader.read_frame() {
            Ok(frame) => {
                trace!(len = frame.len(), "frame received");
                if self.channel.publish(frame) {
                    StatsCounters::bump(&self.stats.frames_overwritten);
                }
                StatsCounters::bump(&self.stats.frames_published);
                self.state = IngestState::AwaitingData;
                Ok(())
            }
            Err(err) => {
                StatsCounters::bump(&self.stats.frames_rejected);
                Err(err.into())
            }
        }
    }

    /// A sender that leaves part of a header unread for longer than the
    /// read timeout is handed to the reader, which then fails or finishes.
    fn partial_header_stalled(&mut self, available: usize) -> bool {
        let Some(limit) = self.config.frame.read_timeout else {
            return false;
        };
        if available == 0 {
            self.partial_since = None;
            return false;
        }
        let since = *self.partial_since.get_or_insert_with(Instant::now);
        since.elapsed() >= limit
    }

    fn teardown(&mut self, err: &IngestError) {
        self.state = IngestState::Backoff;
        self.partial_since = None;
        match self.reader.take() {
            Some(reader) => {
                let conn = reader.into_inner();
                info!(peer = ?conn.peer_addr(), kind = err.kind(), reason = %err, "dropping connection");
                conn.close();
                StatsCounters::bump(&self.stats.connections_dropped);
            }
            None => warn!(error = %err, "ingest cycle failed"),
        }
        std::thread::sleep(self.config.reconnect_backoff);
        self.state = IngestState::NoConnection;
    }

    fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.into_inner().close();
        }
        self.state = IngestState::NoConnection;
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::time::Duration;

    use framecast_frame::{FrameWriter, MAGIC};
    use framecast_transport::connect;

    use super::*;

    fn fast_config() -> IngestConfig {
        IngestConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            accept_poll: Duration::from_millis(2),
            idle_poll: Duration::from_millis(1),
            reconnect_backoff: Duration::from_millis(2),
            ..IngestConfig::default()
        }
    }

    fn bound_loop(config: IngestConfig) -> (IngestLoop, Arc<FrameChannel>, SocketAddr) {
        let channel = Arc::new(FrameChannel::new());
        let ingest = IngestLoop::bind(config, Arc::clone(&channel)).unwrap();
        let addr = ingest.local_addr().unwrap();
        (ingest, channel, addr)
    }

    fn step_until(ingest: &mut IngestLoop, mut done: impl FnMut(&IngestLoop) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(3);
        while !done(ingest) {
            assert!(Instant::now() < deadline, "condition not reached");
            ingest.step();
        }
    }

    fn header(magic: &[u8], len: u32) -> Vec<u8> {
        let mut out = magic.to_vec();
        out.extend_from_slice(&len.to_be_bytes());
        out
    }

    fn assert_closed_by_server(client: &mut TcpConnection) {
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut buf = [0u8; 1];
        match client.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => panic!("unexpected {n} bytes from server"),
            Err(err) => assert!(
                matches!(
                    err.kind(),
                    std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::BrokenPipe
                ),
                "unexpected error {err}"
            ),
        }
    }

    #[test]
    fn starts_with_no_connection() {
        let (mut ingest, channel, _addr) = bound_loop(fast_config());
        assert_eq!(ingest.state(), IngestState::NoConnection);
        assert_eq!(ingest.step(), IngestState::NoConnection);
        assert!(channel.take_latest().is_none());
    }

    #[test]
    fn valid_frame_is_published_once() {
        let (mut ingest, channel, addr) = bound_loop(fast_config());
        let mut client = FrameWriter::new(connect(addr).unwrap());

        step_until(&mut ingest, |l| l.state() == IngestState::AwaitingData);
        client.send(b"hello").unwrap();
        step_until(&mut ingest, |_| channel.has_pending());

        assert_eq!(channel.take_latest().unwrap().payload.as_ref(), b"hello");
        assert!(channel.take_latest().is_none());
        assert_eq!(ingest.state(), IngestState::AwaitingData);
        assert_eq!(ingest.stats().frames_published, 1);
    }

    #[test]
    fn unconsumed_frame_is_replaced_by_newer_one() {
        let (mut ingest, channel, addr) = bound_loop(fast_config());
        let mut client = FrameWriter::new(connect(addr).unwrap());

        client.send(b"first").unwrap();
        client.send(b"second").unwrap();
        step_until(&mut ingest, |l| l.stats().frames_published == 2);

        assert_eq!(channel.take_latest().unwrap().payload.as_ref(), b"second");
        assert!(channel.take_latest().is_none());
        assert_eq!(ingest.stats().frames_overwritten, 1);
    }

    #[test]
    fn oversized_frame_drops_connection_and_keeps_prior_frame_state() {
        let (mut ingest, channel, addr) = bound_loop(fast_config());
        let mut client = FrameWriter::new(connect(addr).unwrap());

        client.send(b"hello").unwrap();
        step_until(&mut ingest, |_| channel.has_pending());
        assert_eq!(channel.take_latest().unwrap().payload.as_ref(), b"hello");

        client.get_mut().write_all(&header(&MAGIC, 600_000)).unwrap();
        step_until(&mut ingest, |l| l.stats().connections_dropped == 1);

        assert!(channel.take_latest().is_none());
        assert_eq!(ingest.state(), IngestState::NoConnection);
        assert_eq!(ingest.stats().frames_rejected, 1);
        assert_closed_by_server(client.get_mut());

        let mut next = FrameWriter::new(connect(addr).unwrap());
        next.send(b"again").unwrap();
        step_until(&mut ingest, |_| channel.has_pending());
        assert_eq!(channel.take_latest().unwrap().payload.as_ref(), b"again");
        assert_eq!(ingest.stats().connections_accepted, 2);
    }

    #[test]
    fn zero_length_frame_drops_connection() {
        let (mut ingest, channel, addr) = bound_loop(fast_config());
        let mut client = connect(addr).unwrap();

        client.write_all(&header(&MAGIC, 0)).unwrap();
        step_until(&mut ingest, |l| l.stats().connections_dropped == 1);

        assert!(channel.take_latest().is_none());
        assert_closed_by_server(&mut client);
    }

    #[test]
    fn bad_magic_drops_connection_regardless_of_payload() {
        let (mut ingest, channel, addr) = bound_loop(fast_config());
        let mut client = connect(addr).unwrap();

        let mut bytes = header(b"IMG?", 5);
        bytes.extend_from_slice(b"hello");
        client.write_all(&bytes).unwrap();
        step_until(&mut ingest, |l| l.stats().connections_dropped == 1);

        assert!(channel.take_latest().is_none());
        assert_eq!(ingest.stats().frames_published, 0);
        assert_closed_by_server(&mut client);
    }

    #[test]
    fn payload_that_never_completes_times_out() {
        let config = IngestConfig {
            frame: framecast_frame::FrameConfig {
                payload_wait: Duration::from_millis(10),
                ..framecast_frame::FrameConfig::default()
            },
            ..fast_config()
        };
        let (mut ingest, channel, addr) = bound_loop(config);
        let mut client = connect(addr).unwrap();

        let mut bytes = header(&MAGIC, 100);
        bytes.extend_from_slice(b"only-a-little");
        client.write_all(&bytes).unwrap();
        step_until(&mut ingest, |l| l.stats().connections_dropped == 1);

        assert!(channel.take_latest().is_none());
        assert_closed_by_server(&mut client);
    }

    #[test]
    fn clean_close_between_frames_returns_to_no_connection() {
        let (mut ingest, channel, addr) = bound_loop(fast_config());
        let mut client = FrameWriter::new(connect(addr).unwrap());

        client.send(b"frame").unwrap();
        step_until(&mut ingest, |_| channel.has_pending());
        client.into_inner().close();

        step_until(&mut ingest, |l| l.stats().connections_dropped == 1);
        assert_eq!(ingest.state(), IngestState::NoConnection);
        assert_eq!(channel.take_latest().unwrap().payload.as_ref(), b"frame");
    }

    #[test]
    fn partial_header_then_close_is_eventually_dropped() {
        let config = IngestConfig {
            frame: framecast_frame::FrameConfig {
                read_timeout: Some(Duration::from_millis(20)),
                ..framecast_frame::FrameConfig::default()
            },
            ..fast_config()
        };
        let (mut ingest, channel, addr) = bound_loop(config);
        let mut client = connect(addr).unwrap();

        step_until(&mut ingest, |l| l.state() == IngestState::AwaitingData);
        client.write_all(b"IMG").unwrap();
        client.close();

        step_until(&mut ingest, |l| l.stats().connections_dropped == 1);
        assert!(channel.take_latest().is_none());
    }

    #[test]
    fn run_exits_when_flag_is_raised() {
        let (ingest, _channel, addr) = bound_loop(fast_config());
        let flag = ingest.shutdown_flag();
        let handle = std::thread::spawn(move || ingest.run());

        let _client = connect(addr).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        flag.store(true, Ordering::Release);

        let stats = handle.join().unwrap();
        assert_eq!(stats.connections_accepted, 1);
    }
}
