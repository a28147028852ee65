//! Wire codecs for the robot control link.
//!
//! Outbound, every telemetry message is one JSON object terminated by a
//! single `\n`; the newline is the only delimiter. Inbound, the server sends
//! bare motion tokens (`FORWARD`, `STOP`, ...) with an optional trailing
//! newline.

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod telemetry;
pub mod writer;

pub use codec::{decode_frame, encode_frame, FrameConfig, DEFAULT_MAX_LINE, DELIMITER};
pub use command::{decode_commands, Directive};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use telemetry::{FrameKind, ImagePayload, Reading, TelemetryFrame, TYPE_KEY};
pub use writer::FrameWriter;
