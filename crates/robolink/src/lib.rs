//! Robot control link over a single TCP connection.
//!
//! The robot streams newline-delimited JSON telemetry to its control server
//! and takes plain-text motion commands back over the same socket.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connect/listen and the shared stream handle
//! - [`frame`]: telemetry frame encoding and command token decoding
//! - [`session`]: the two-duty link session and its hardware seams

/// Re-export transport types.
pub mod transport {
    pub use robolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use robolink_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use robolink_session::*;
}
