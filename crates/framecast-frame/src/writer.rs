use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use framecast_transport::TcpConnection;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// This is the sender side of the protocol. Payloads the receiver would
/// reject are refused before anything is written.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.payload.as_ref())
    }

    /// Encode and send a payload.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(payload, self.config.max_payload_size, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    return Err(FrameError::Io(std::io::Error::from(ErrorKind::WriteZero)))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameWriter<TcpConnection> {
    /// Create a frame writer for a TCP connection and apply the write timeout from config.
    pub fn with_config_tcp(inner: TcpConnection, config: FrameConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::codec::{HEADER_SIZE, MAX_PAYLOAD};

    #[test]
    fn send_writes_header_and_payload() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.send(b"hello").unwrap();

        let out = writer.into_inner();
        assert_eq!(out.len(), HEADER_SIZE + 5);
        assert_eq!(&out[..8], b"IMG!\x00\x00\x00\x05");
        assert_eq!(&out[8..], b"hello");
    }

    #[test]
    fn write_frame_matches_send() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_frame(&Frame::new(&b"abc"[..])).unwrap();
        assert_eq!(writer.get_ref().as_slice(), b"IMG!\x00\x00\x00\x03abc");
    }

    #[test]
    fn empty_payload_is_refused_before_writing() {
        let mut writer = FrameWriter::new(Vec::new());
        let err = writer.send(b"").unwrap_err();
        assert!(matches!(err, FrameError::ProtocolViolation { len: 0, .. }));
        assert!(writer.get_ref().is_empty());
    }

    #[test]
    fn oversized_payload_is_refused_before_writing() {
        let mut writer = FrameWriter::new(Vec::new());
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let err = writer.send(&payload).unwrap_err();
        assert!(matches!(err, FrameError::ProtocolViolation { .. }));
        assert!(writer.get_ref().is_empty());
    }

    #[test]
    fn partial_writes_are_completed() {
        struct OneByteWriter(Vec<u8>);
        impl Write for OneByteWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if buf.is_empty() {
                    return Ok(0);
                }
                self.0.push(buf[0]);
                Ok(1)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(OneByteWriter(Vec::new()));
        writer.send(b"slow").unwrap();
        assert_eq!(writer.get_ref().0, b"IMG!\x00\x00\x00\x04slow");
    }

    #[test]
    fn zero_length_write_is_error() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(Closed);
        let err = writer.send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }
}
