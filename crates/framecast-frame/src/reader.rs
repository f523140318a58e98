use std::io::{ErrorKind, Read};
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use framecast_transport::{Available, TcpConnection};
use tracing::trace;

use crate::codec::{Frame, FrameConfig, Header, MAGIC};
use crate::error::{FrameError, FramingFault, Result};

/// Reads one complete frame at a time from a live stream.
///
/// The stream must be able to report pending bytes so payload reads never
/// block past the wait budget. Any error leaves the stream
/// at an unknown offset; the caller is expected to drop the connection.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read + Available> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame (blocking, bounded by the payload wait).
    pub fn read_frame(&mut self) -> Result<Frame> {
        self.read_magic()?;
        let len = self.read_header()?.validate(self.config.max_payload_size)?;
        let payload = self.read_payload(len)?;
        trace!(len, "frame read");
        Ok(Frame { payload })
    }

    /// Bytes ready on the underlying stream.
    pub fn available(&self) -> Result<usize> {
        self.inner.available().map_err(FrameError::Io)
    }

    fn read_magic(&mut self) -> Result<()> {
        for (position, &expected) in MAGIC.iter().enumerate() {
            match self.read_byte()? {
                None => return Err(FrameError::Framing(FramingFault::EndOfStream { position })),
                Some(found) if found != expected => {
                    return Err(FrameError::Framing(FramingFault::BadMagic { position, found }))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    fn read_header(&mut self) -> Result<Header> {
        let mut len = [0u8; 4];
        let mut read = 0usize;
        while read < len.len() {
            match self.inner.read(&mut len[read..]) {
                Ok(0) => return Err(FrameError::Framing(FramingFault::ShortLength { read })),
                Ok(n) => read += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(Header::from_length_bytes(len))
    }

    /// Drain the payload as it arrives, giving up once the wait budget is spent.
    ///
    /// Only bytes already reported as pending are read, so a payload larger
    /// than the socket receive buffer still completes.
    fn read_payload(&mut self, len: usize) -> Result<Bytes> {
        let start = Instant::now();
        let mut buf = BytesMut::zeroed(len);
        let mut read = 0usize;
        while read < len {
            let available = self.available()?;
            if available == 0 {
                if start.elapsed() >= self.config.payload_wait {
                    return Err(FrameError::Timeout {
                        expected: len,
                        received: read,
                        waited: start.elapsed(),
                    });
                }
                std::thread::sleep(self.config.payload_poll);
                continue;
            }

            let want = available.min(len - read);
            match self.inner.read(&mut buf[read..read + want]) {
                Ok(0) => {
                    return Err(FrameError::IncompleteFrame {
                        read,
                        expected: len,
                    })
                }
                Ok(n) => read += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(buf.freeze())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<TcpConnection> {
    /// Create a frame reader for a TCP connection and apply the read timeout from config.
    pub fn with_config_tcp(inner: TcpConnection, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
