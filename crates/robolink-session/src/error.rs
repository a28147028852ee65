/// Errors that can occur in link session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The single connect attempt failed; no duty was started.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        source: robolink_transport::TransportError,
    },

    /// Transport-level error while setting up the session.
    #[error("transport error: {0}")]
    Transport(#[from] robolink_transport::TransportError),

    /// Frame-level error outside the send loop.
    #[error("frame error: {0}")]
    Frame(#[from] robolink_frame::FrameError),

    /// Writing telemetry failed; the session is closed.
    #[error("telemetry write failed: {0}")]
    Write(robolink_frame::FrameError),

    /// The receive thread could not be started.
    #[error("failed to spawn receive thread: {0}")]
    Spawn(std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (HTTP variant only).
    #[cfg(feature = "http")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors reported by a sensor or camera adapter.
///
/// These never leave the gather step: the failing sensor reports `null` for
/// the cycle and the frame goes out with every other reading.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The sensor was never initialised or is unplugged.
    #[error("sensor not connected")]
    NotConnected,

    /// The driver reported a failed read.
    #[error("read failed: {0}")]
    Read(String),

    /// The driver hit an I/O error (GPIO, I2C, SPI, USB).
    #[error("sensor I/O error: {0}")]
    Io(#[from] std::io::Error),
}
