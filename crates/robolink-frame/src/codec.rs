use std::io;

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use crate::error::{FrameError, Result};

/// Frame delimiter on the wire.
pub const DELIMITER: u8 = b'\n';

/// Default maximum line size accepted by the decoder: 16 MiB.
///
/// Only the receiving side enforces a limit. The encoder accepts frames of
/// any size (base64 camera frames included).
pub const DEFAULT_MAX_LINE: usize = 16 * 1024 * 1024;

/// JSON formatter matching the separators control servers already parse:
/// `", "` between members and `": "` after keys, all on one line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Encode a value as one telemetry line.
///
/// Wire format:
/// ```text
/// {"type": "SENSOR", "flame": true, "gas": null}\n
/// ```
///
/// JSON string escaping guarantees the payload itself never contains a raw
/// newline, so the trailing `\n` is the only delimiter. On error nothing is
/// left appended to `dst`.
pub fn encode_frame<T>(value: &T, dst: &mut BytesMut) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let start = dst.len();
    let written = {
        let mut ser = serde_json::Serializer::with_formatter((&mut *dst).writer(), SpacedFormatter);
        value.serialize(&mut ser)
    };
    if let Err(err) = written {
        dst.truncate(start);
        return Err(err.into());
    }
    dst.put_u8(DELIMITER);
    Ok(())
}

/// Decode one telemetry line from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete line yet.
/// Blank lines are skipped. The line is consumed from the buffer even when it
/// fails to parse, so a caller can log the error and keep reading.
pub fn decode_frame(src: &mut BytesMut, max_line: usize) -> Result<Option<Map<String, Value>>> {
    loop {
        let Some(pos) = src.iter().position(|b| *b == DELIMITER) else {
            if src.len() > max_line {
                return Err(FrameError::LineTooLong {
                    size: src.len(),
                    max: max_line,
                });
            }
            return Ok(None); // Need more data
        };

        let line = src.split_to(pos + 1);
        let mut body = &line[..pos];
        if let Some(stripped) = body.strip_suffix(b"\r") {
            body = stripped;
        }

        if body.len() > max_line {
            return Err(FrameError::LineTooLong {
                size: body.len(),
                max: max_line,
            });
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        return match serde_json::from_slice::<Value>(body)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(FrameError::NotAnObject),
        };
    }
}

/// Configuration for the line codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted line size in bytes when decoding. Default: 16 MiB.
    pub max_line_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line_size: DEFAULT_MAX_LINE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test value must be an object"),
        }
    }

    #[test]
    fn test_encode_preserves_order_and_spacing() {
        let mut frame = Map::new();
        frame.insert("flame".to_string(), Value::Bool(true));
        frame.insert("gas".to_string(), Value::Null);

        let mut buf = BytesMut::new();
        encode_frame(&frame, &mut buf).unwrap();

        assert_eq!(buf.as_ref(), b"{\"flame\": true, \"gas\": null}\n");
    }

    #[test]
    fn test_encode_nested_mapping_and_array() {
        let frame = map(json!({
            "type": "SENSOR",
            "dust": {"pm_2p5_grimm": 12.5, "status": 1},
            "psd": [1, 2, 3]
        }));

        let mut buf = BytesMut::new();
        encode_frame(&frame, &mut buf).unwrap();

        assert_eq!(
            buf.as_ref(),
            b"{\"type\": \"SENSOR\", \"dust\": {\"pm_2p5_grimm\": 12.5, \"status\": 1}, \"psd\": [1, 2, 3]}\n"
        );
    }

    #[test]
    fn test_encode_escapes_embedded_newline() {
        let frame = map(json!({"note": "line one\nline two"}));

        let mut buf = BytesMut::new();
        encode_frame(&frame, &mut buf).unwrap();

        let newlines = buf.iter().filter(|b| **b == DELIMITER).count();
        assert_eq!(newlines, 1);
        assert_eq!(buf.last(), Some(&DELIMITER));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = map(json!({
            "type": "SENSOR",
            "flame": false,
            "pir": null,
            "co2": {"raw": 512, "volt": 0.18, "ppm": 450.0},
            "label": "kitchen"
        }));

        let mut buf = BytesMut::new();
        encode_frame(&frame, &mut buf).unwrap();
        let decoded = decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();

        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_line() {
        let mut buf = BytesMut::from(&b"{\"flame\": tr"[..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap().is_none());
        assert_eq!(buf.len(), 12);
    }

    #[test]
    fn test_decode_multiple_lines() {
        let mut buf = BytesMut::from(&b"{\"a\": 1}\n{\"b\": 2}\n"[..]);

        let first = decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();
        let second = decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();

        assert_eq!(first["a"], json!(1));
        assert_eq!(second["b"], json!(2));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_skips_blank_lines_and_crlf() {
        let mut buf = BytesMut::from(&b"\n\r\n{\"a\": 1}\r\n"[..]);
        let frame = decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();
        assert_eq!(frame["a"], json!(1));
    }

    #[test]
    fn test_decode_malformed_line_is_consumed() {
        let mut buf = BytesMut::from(&b"{not json}\n{\"ok\": true}\n"[..]);

        let err = decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap_err();
        assert!(matches!(err, FrameError::Json(_)));

        let next = decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();
        assert_eq!(next["ok"], json!(true));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let mut buf = BytesMut::from(&b"[1, 2]\n"[..]);
        let err = decode_frame(&mut buf, DEFAULT_MAX_LINE).unwrap_err();
        assert!(matches!(err, FrameError::NotAnObject));
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut buf = BytesMut::from(&b"{\"data\": \"aaaaaaaaaaaaaaaa"[..]);
        let err = decode_frame(&mut buf, 8).unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { .. }));
    }

    #[test]
    fn test_encode_empty_map() {
        let mut buf = BytesMut::new();
        encode_frame(&Map::new(), &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"{}\n");
    }
}
