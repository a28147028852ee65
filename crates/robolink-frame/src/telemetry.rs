use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::{Bytes, BytesMut};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::codec::encode_frame;
use crate::error::Result;

/// Key carrying the frame type tag. Reserved: sensors cannot use it.
pub const TYPE_KEY: &str = "type";

/// Image encoding advertised in IMAGE frames.
pub const IMAGE_FORMAT: &str = "jpg";

/// Type tag of a telemetry frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Snapshot of sensor readings.
    Sensor,
    /// One camera frame.
    Image,
}

impl FrameKind {
    /// Wire value of the `"type"` key.
    pub fn as_str(self) -> &'static str {
        match self {
            FrameKind::Sensor => "SENSOR",
            FrameKind::Image => "IMAGE",
        }
    }
}

/// One sensor reading.
///
/// Sensor kinds are heterogeneous: a flame detector yields a flag, a CO2
/// probe a group of raw/volt/ppm values, an unplugged sensor nothing at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Sensor absent or unreadable; encoded as `null`.
    Absent,
    Flag(bool),
    Integer(i64),
    /// Non-finite values encode as `null`.
    Number(f64),
    Text(String),
    /// Named sub-readings, kept in the given order.
    Group(Vec<(String, Reading)>),
    /// Raw bytes; encoded as standard base64 text.
    Blob(Bytes),
}

impl Reading {
    /// Build a group reading from `(name, reading)` pairs.
    pub fn group<K, R>(fields: impl IntoIterator<Item = (K, R)>) -> Self
    where
        K: Into<String>,
        R: Into<Reading>,
    {
        Reading::Group(
            fields
                .into_iter()
                .map(|(k, r)| (k.into(), r.into()))
                .collect(),
        )
    }

    /// JSON value of this reading.
    pub fn to_value(&self) -> Value {
        match self {
            Reading::Absent => Value::Null,
            Reading::Flag(flag) => Value::Bool(*flag),
            Reading::Integer(n) => Value::Number((*n).into()),
            Reading::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Reading::Text(text) => Value::String(text.clone()),
            Reading::Group(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, reading)| (name.clone(), reading.to_value()))
                    .collect(),
            ),
            Reading::Blob(bytes) => Value::String(BASE64.encode(bytes)),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Reading::Absent)
    }
}

impl From<Reading> for Value {
    fn from(reading: Reading) -> Self {
        reading.to_value()
    }
}

impl From<bool> for Reading {
    fn from(value: bool) -> Self {
        Reading::Flag(value)
    }
}

impl From<i64> for Reading {
    fn from(value: i64) -> Self {
        Reading::Integer(value)
    }
}

impl From<i32> for Reading {
    fn from(value: i32) -> Self {
        Reading::Integer(value.into())
    }
}

impl From<u32> for Reading {
    fn from(value: u32) -> Self {
        Reading::Integer(value.into())
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Number(value)
    }
}

impl From<f32> for Reading {
    fn from(value: f32) -> Self {
        Reading::Number(value.into())
    }
}

impl From<&str> for Reading {
    fn from(value: &str) -> Self {
        Reading::Text(value.to_string())
    }
}

impl From<String> for Reading {
    fn from(value: String) -> Self {
        Reading::Text(value)
    }
}

impl From<Bytes> for Reading {
    fn from(value: Bytes) -> Self {
        Reading::Blob(value)
    }
}

impl<T: Into<Reading>> From<Option<T>> for Reading {
    fn from(value: Option<T>) -> Self {
        value.map_or(Reading::Absent, Into::into)
    }
}

/// One captured camera image ready to be framed.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// JPEG-encoded image bytes.
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
    /// Capture time, seconds since the Unix epoch.
    pub timestamp: f64,
}

/// A telemetry frame: a type tag plus named readings in insertion order.
///
/// The tag is not stored among the fields; it is emitted as the first key on
/// the wire by [`TelemetryFrame::to_wire`].
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFrame {
    kind: FrameKind,
    fields: Map<String, Value>,
}

impl TelemetryFrame {
    /// Create an empty frame of the given kind.
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            fields: Map::new(),
        }
    }

    /// Create an empty SENSOR frame.
    pub fn sensor() -> Self {
        Self::new(FrameKind::Sensor)
    }

    /// Build an IMAGE frame from one captured image.
    pub fn image(payload: &ImagePayload) -> Self {
        let mut frame = Self::new(FrameKind::Image);
        frame.insert("width", payload.width);
        frame.insert("height", payload.height);
        frame.insert("format", IMAGE_FORMAT);
        frame.insert("timestamp", payload.timestamp);
        frame.insert("data", Reading::Blob(payload.jpeg.clone()));
        frame
    }

    /// Add a reading. A later insert under the same name replaces the value
    /// and keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, reading: impl Into<Reading>) {
        let name = name.into();
        if name == TYPE_KEY {
            warn!("ignoring reading named \"{TYPE_KEY}\" (reserved for the frame tag)");
            return;
        }
        self.fields.insert(name, reading.into().to_value());
    }

    /// Add an already encoded JSON value, as read back from the wire.
    pub fn insert_value(&mut self, name: String, value: Value) {
        if name == TYPE_KEY {
            return;
        }
        self.fields.insert(name, value);
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Value of a named reading.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of readings (the type tag excluded).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Readings without the type tag, as posted by the HTTP variant.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Full wire object: `"type"` first, then the readings.
    pub fn to_wire(&self) -> Map<String, Value> {
        let mut wire = Map::with_capacity(self.fields.len() + 1);
        wire.insert(
            TYPE_KEY.to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        for (name, value) in &self.fields {
            wire.insert(name.clone(), value.clone());
        }
        wire
    }

    /// Append the newline-terminated wire form to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        encode_frame(&self.to_wire(), dst)
    }
}
