/// Errors that can occur while ingesting frames.
///
/// Only a bind failure escapes to the host; everything else is handled
/// inside the loop by dropping the connection.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] framecast_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] framecast_frame::FrameError),

    /// The liveness check found the peer gone.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The ingest thread could not be spawned.
    #[error("failed to spawn ingest thread: {0}")]
    Spawn(std::io::Error),

    /// The ingest thread panicked before it could be joined.
    #[error("ingest thread panicked")]
    ThreadPanicked,
}

impl IngestError {
    /// True when the listening endpoint could not start.
    pub fn is_bind(&self) -> bool {
        matches!(self, IngestError::Transport(err) if err.is_bind())
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Transport(_) => "transport",
            IngestError::Frame(err) => err.kind(),
            IngestError::ConnectionLost(_) => "connection_lost",
            IngestError::Spawn(_) => "spawn",
            IngestError::ThreadPanicked => "thread_panicked",
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
