use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::traits::Available;

/// A live TCP connection to a frame sender.
///
/// Implements `Read` + `Write` and reports pending bytes through
/// [`Available`]. Dropping the connection closes the socket.
pub struct TcpConnection {
    stream: TcpStream,
    peer: Option<SocketAddr>,
}

impl TcpConnection {
    /// Wrap an accepted or connected stream, forcing it into blocking mode.
    pub(crate) fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr().ok();
        Ok(Self { stream, peer })
    }

    /// Address of the remote peer, if it was known when the connection was made.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Borrow the raw stream.
    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }

    /// Shut down both halves and release the socket.
    ///
    /// Errors are ignored: the peer may already be gone.
    pub fn close(self) {
        if let Err(err) = self.stream.shutdown(Shutdown::Both) {
            if err.kind() != io::ErrorKind::NotConnected {
                debug!(peer = ?self.peer, error = %err, "socket shutdown failed");
            }
        }
    }
}

impl Read for TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Read for &TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.stream).read(buf)
    }
}

impl Write for TcpConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Available for TcpConnection {
    #[cfg(unix)]
    fn available(&self) -> io::Result<usize> {
        use std::os::fd::AsRawFd;

        let mut pending: libc::c_int = 0;
        // SAFETY: `pending` is a valid writable c_int for FIONREAD, and the
        // descriptor is an open socket owned by this connection.
        let rc = unsafe {
            libc::ioctl(
                self.stream.as_raw_fd(),
                libc::FIONREAD,
                &mut pending as *mut libc::c_int,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(pending.max(0) as usize)
    }

    #[cfg(not(unix))]
    fn available(&self) -> io::Result<usize> {
        const PEEK_PROBE_SIZE: usize = 256 * 1024;

        let mut probe = vec![0u8; PEEK_PROBE_SIZE];
        self.stream.set_nonblocking(true)?;
        let peeked = self.stream.peek(&mut probe);
        self.stream.set_nonblocking(false)?;
        match peeked {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnection")
            .field("peer", &self.peer)
            .finish()
    }
}
