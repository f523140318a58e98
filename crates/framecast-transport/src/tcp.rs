use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::connection::TcpConnection;
use crate::error::{Result, TransportError};

/// Port the receiver listens on when none is configured.
pub const DEFAULT_PORT: u16 = 6002;

/// Non-blocking TCP listening endpoint.
///
/// Polled with [`TcpAcceptor::try_accept`] so the caller never parks inside
/// `accept(2)` and can observe shutdown between polls. The listening socket
/// is closed when the acceptor is dropped.
pub struct TcpAcceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpAcceptor {
    /// Bind and listen on `addr`.
    ///
    /// Failure here is a configuration error: callers should surface it
    /// rather than retry.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let display = format!("{addr:?}");
        let bind_err = |source| TransportError::Bind {
            addr: display.clone(),
            source,
        };

        let listener = TcpListener::bind(&addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        info!(addr = %local_addr, "listening for frame sender");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept a pending connection if there is one.
    ///
    /// Returns `Ok(None)` when nobody is waiting.
    pub fn try_accept(&self) -> Result<Option<TcpConnection>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                TcpConnection::from_stream(stream).map(Some)
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The address this endpoint is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

/// Connect to a listening receiver (blocking).
pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<TcpConnection> {
    let stream = TcpStream::connect(&addr).map_err(|source| TransportError::Connect {
        addr: format!("{addr:?}"),
        source,
    })?;
    debug!(peer = ?stream.peer_addr().ok(), "connected to receiver");
    TcpConnection::from_stream(stream)
}

impl std::fmt::Debug for TcpAcceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpAcceptor")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}
