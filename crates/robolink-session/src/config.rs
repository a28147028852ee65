use std::time::Duration;

/// Default control server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default control server port.
pub const DEFAULT_PORT: u16 = 6000;
/// Default telemetry period.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(500);
/// Default receive chunk size in bytes.
pub const DEFAULT_RECV_CHUNK: usize = 1024;

/// Configuration for one link session.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Control server host name or address.
    pub host: String,
    /// Control server port.
    pub port: u16,
    /// Interval between telemetry frames.
    pub period: Duration,
    /// Maximum bytes taken from the socket per command read.
    pub recv_chunk_size: usize,
    /// Connect timeout. `None` uses the transport default.
    pub connect_timeout: Option<Duration>,
    /// Write timeout for telemetry frames. `None` blocks until the kernel
    /// accepts the data or reports an error.
    pub write_timeout: Option<Duration>,
}

impl LinkConfig {
    /// Config for `host:port` with every other setting at its default.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// `host:port` string handed to the transport.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            period: DEFAULT_PERIOD,
            recv_chunk_size: DEFAULT_RECV_CHUNK,
            connect_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_server() {
        let config = LinkConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:6000");
        assert_eq!(config.period, Duration::from_millis(500));
        assert_eq!(config.recv_chunk_size, 1024);
        assert!(config.connect_timeout.is_none());
        assert!(config.write_timeout.is_none());
    }

    #[test]
    fn new_overrides_endpoint_only() {
        let config = LinkConfig::new("192.168.0.19", 7000);
        assert_eq!(config.addr(), "192.168.0.19:7000");
        assert_eq!(config.period, DEFAULT_PERIOD);
    }
}
