/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Received bytes are not valid UTF-8.
    #[error("invalid UTF-8 in received data: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A telemetry line is not valid JSON.
    #[error("malformed JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    /// A telemetry line is valid JSON but not an object.
    #[error("telemetry frame is not a JSON object")]
    NotAnObject,

    /// A telemetry line exceeds the configured maximum size.
    #[error("line too long ({size} bytes, max {max})")]
    LineTooLong { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
