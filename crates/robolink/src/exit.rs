use std::fmt;
use std::io;

use robolink_frame::FrameError;
use robolink_session::SessionError;
use robolink_transport::TransportError;

pub const SUCCESS: i32 = 0;
/// Connection refused, peer gone, or a request the server did not accept.
pub const FAILURE: i32 = 1;
/// The link broke after it was established.
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Exit code for an I/O failure while setting up a connection.
pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::Resolve { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

/// Exit code for a frame error on an established link.
pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(ref source)
            if matches!(
                source.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ) =>
        {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        FrameError::Io(_) | FrameError::ConnectionClosed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        FrameError::LineTooLong { .. }
        | FrameError::Json(_)
        | FrameError::NotAnObject
        | FrameError::InvalidUtf8(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Connect { source, .. } => transport_error(context, source),
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::Write(err) => frame_error(context, err),
        SessionError::Json(err) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        SessionError::Http(err) => CliError::new(FAILURE, format!("{context}: {err}")),
        SessionError::Spawn(err) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_refused_is_failure() {
        let err = SessionError::Connect {
            addr: "127.0.0.1:6000".to_string(),
            source: TransportError::Connect {
                addr: "127.0.0.1:6000".to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            },
        };
        assert_eq!(session_error("connect failed", err).code, FAILURE);
    }

    #[test]
    fn connect_timeout_is_timeout() {
        let err = TransportError::Connect {
            addr: "10.0.0.1:6000".to_string(),
            source: io::Error::from(io::ErrorKind::TimedOut),
        };
        assert_eq!(transport_error("connect failed", err).code, TIMEOUT);
    }

    #[test]
    fn broken_link_mid_session_is_transport_error() {
        let err = SessionError::Write(FrameError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        let cli = session_error("telemetry failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("telemetry failed: "));
    }

    #[test]
    fn oversized_line_is_data_invalid() {
        let err = FrameError::LineTooLong { size: 20, max: 10 };
        assert_eq!(frame_error("receive failed", err).code, DATA_INVALID);
    }
}
