//! Connection liveness probing.

use std::io::ErrorKind;
use std::net::TcpStream;

use tracing::trace;

use crate::connection::TcpConnection;

/// Decide whether a held connection is still alive without consuming bytes.
///
/// Returns `false` for no connection, a socket with a pending error, or a
/// socket that is readable but peeks zero bytes (the peer closed cleanly).
/// Any failure while probing also counts as dead. An idle socket and a
/// socket with real data pending are both alive.
pub fn is_alive(conn: Option<&TcpConnection>) -> bool {
    match conn {
        Some(conn) => probe(conn.get_ref()),
        None => false,
    }
}

fn probe(stream: &TcpStream) -> bool {
    if stream.peer_addr().is_err() {
        return false;
    }
    if !matches!(stream.take_error(), Ok(None)) {
        return false;
    }
    if stream.set_nonblocking(true).is_err() {
        return false;
    }

    let mut byte = [0u8; 1];
    let alive = match stream.peek(&mut byte) {
        Ok(0) => false,
        Ok(_) => true,
        Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => true,
        Err(err) => {
            trace!(error = %err, "liveness peek failed");
            false
        }
    };

    // A socket we cannot put back into blocking mode is unusable for framing.
    if stream.set_nonblocking(false).is_err() {
        return false;
    }
    alive
}
