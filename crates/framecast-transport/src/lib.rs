//! Single-connection TCP transport.
//!
//! This is the lowest layer of framecast. It owns the listening endpoint,
//! hands out at most one [`TcpConnection`] at a time, and answers two
//! questions about a held connection without consuming protocol bytes:
//! - how many bytes are ready to read ([`Available`])
//! - whether the peer is still there ([`is_alive`])

pub mod connection;
pub mod error;
pub mod guard;
pub mod tcp;
pub mod traits;

pub use connection::TcpConnection;
pub use error::{Result, TransportError};
pub use guard::is_alive;
pub use tcp::{connect, TcpAcceptor, DEFAULT_PORT};
pub use traits::Available;
