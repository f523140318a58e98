use std::net::SocketAddr;
use std::time::Duration;

use framecast_frame::FrameConfig;
use framecast_transport::DEFAULT_PORT;

/// Ingest loop configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Address to listen on. Default: `0.0.0.0:6002`.
    pub bind_addr: SocketAddr,
    /// Framing limits and payload wait budget.
    pub frame: FrameConfig,
    /// Sleep between accept polls while no sender is connected.
    pub accept_poll: Duration,
    /// Sleep while a connection has less than a header's worth of data.
    pub idle_poll: Duration,
    /// Pause after dropping a connection before accepting again.
    pub reconnect_backoff: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            frame: FrameConfig::default(),
            accept_poll: Duration::from_millis(100),
            idle_poll: Duration::from_millis(5),
            reconnect_backoff: Duration::from_millis(100),
        }
    }
}

impl IngestConfig {
    /// Override the listening address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Override only the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Override framing config.
    pub fn with_frame_config(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }
}

/// Expected size of decoded frames, for the rendering side only.
///
/// The ingest loop never looks at this; it is carried so a presenter can
/// size its surface before the first frame arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_receiver_contract() {
        let cfg = IngestConfig::default();
        assert_eq!(cfg.bind_addr.port(), 6002);
        assert!(cfg.bind_addr.ip().is_unspecified());
        assert_eq!(cfg.accept_poll, Duration::from_millis(100));
        assert_eq!(cfg.idle_poll, Duration::from_millis(5));
        assert_eq!(cfg.reconnect_backoff, Duration::from_millis(100));
        assert_eq!(DisplayConfig::default(), DisplayConfig { width: 640, height: 360 });
    }

    #[test]
    fn with_port_keeps_host() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let cfg = IngestConfig::default().with_bind_addr(addr).with_port(7000);
        assert_eq!(cfg.bind_addr, "127.0.0.1:7000".parse::<SocketAddr>().unwrap());
    }
}
