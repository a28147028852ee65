use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use robolink_transport::LinkStream;
use serde_json::{Map, Value};

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::telemetry::{FrameKind, TelemetryFrame, TYPE_KEY};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete telemetry lines from any `Read` stream.
///
/// This is the control-server side of the link. Handles partial reads
/// internally, so callers always get whole frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete JSON object (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached. A
    /// malformed line yields its decode error and is dropped; the next call
    /// continues with the following line.
    pub fn read_frame(&mut self) -> Result<Map<String, Value>> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_line_size)? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next frame and split off its type tag.
    ///
    /// Frames without a recognised `"type"` are reported as SENSOR frames,
    /// which is what the HTTP variant posts.
    pub fn read_telemetry(&mut self) -> Result<TelemetryFrame> {
        let mut wire = self.read_frame()?;
        let kind = match wire.shift_remove(TYPE_KEY).as_ref().and_then(Value::as_str) {
            Some("IMAGE") => FrameKind::Image,
            _ => FrameKind::Sensor,
        };
        let mut frame = TelemetryFrame::new(kind);
        for (name, value) in wire {
            frame.insert_value(name, value);
        }
        Ok(frame)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<LinkStream> {
    /// Create a frame reader for `LinkStream` and apply read timeout from config.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: robolink_transport::TransportError) -> FrameError {
    match err {
        robolink_transport::TransportError::Io(io)
        | robolink_transport::TransportError::Accept(io) => FrameError::Io(io),
        robolink_transport::TransportError::Bind { source, .. }
        | robolink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(b"{\"flame\": true}\n".to_vec()));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame["flame"], json!(true));
    }

    #[test]
    fn read_multiple_frames() {
        let wire = b"{\"seq\": 1}\n{\"seq\": 2}\n{\"seq\": 3}\n".to_vec();
        let mut reader = FrameReader::new(Cursor::new(wire));

        for expected in 1..=3 {
            let frame = reader.read_frame().unwrap();
            assert_eq!(frame["seq"], json!(expected));
        }
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: b"{\"type\": \"SENSOR\", \"gas\": null}\n".to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame["type"], json!("SENSOR"));
        assert_eq!(frame["gas"], Value::Null);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_line() {
        let mut reader = FrameReader::new(Cursor::new(b"{\"flame\": tr".to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn malformed_line_is_skipped_on_next_read() {
        let wire = b"not json\n{\"ok\": 1}\n".to_vec();
        let mut reader = FrameReader::new(Cursor::new(wire));

        assert!(matches!(reader.read_frame(), Err(FrameError::Json(_))));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame["ok"], json!(1));
    }

    #[test]
    fn oversized_line_in_stream() {
        let cfg = FrameConfig {
            max_line_size: 16,
            ..FrameConfig::default()
        };
        let wire = format!("{{\"data\": \"{}\"}}\n", "a".repeat(64)).into_bytes();
        let mut reader = FrameReader::with_config(Cursor::new(wire), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { .. }));
    }

    #[test]
    fn read_telemetry_splits_type_tag() {
        let wire = b"{\"type\": \"IMAGE\", \"width\": 640}\n{\"flame\": false}\n".to_vec();
        let mut reader = FrameReader::new(Cursor::new(wire));

        let image = reader.read_telemetry().unwrap();
        assert_eq!(image.kind(), FrameKind::Image);
        assert_eq!(image.get("width"), Some(&json!(640)));
        assert!(image.get("type").is_none());

        let untagged = reader.read_telemetry().unwrap();
        assert_eq!(untagged.kind(), FrameKind::Sensor);
        assert_eq!(untagged.get("flame"), Some(&json!(false)));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(b"{\"ok\": true}\n".to_vec()),
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame["ok"], json!(true));
    }

    #[test]
    fn would_block_propagates_io_error() {
        let mut framed = FrameReader::new(WouldBlockReader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn roundtrip_over_tcp() {
        let listener = robolink_transport::LinkListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let robot = std::thread::spawn(move || {
            let stream = robolink_transport::connect(&addr).unwrap();
            let mut writer = crate::writer::FrameWriter::new(stream);
            let mut frame = TelemetryFrame::sensor();
            frame.insert("temp", 24.5);
            frame.insert("fire", false);
            writer.write_frame(&frame).unwrap();
        });

        let stream = listener.accept().unwrap();
        let mut reader = FrameReader::with_config_link(stream, FrameConfig::default()).unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame["type"], json!("SENSOR"));
        assert_eq!(frame["temp"], json!(24.5));
        assert_eq!(frame["fire"], json!(false));
        robot.join().unwrap();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct WouldBlockReader;

    impl Read for WouldBlockReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }
}
