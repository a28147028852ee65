use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use robolink_transport::LinkStream;

use crate::codec::{FrameConfig, DELIMITER};
use crate::command::Directive;
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;
use crate::telemetry::TelemetryFrame;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// A write is either fully delivered to the stream or reported as an error;
/// a write timeout surfaces as `FrameError::Io` with `WouldBlock`/`TimedOut`.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and write one telemetry frame. Returns the bytes written.
    pub fn write_frame(&mut self, frame: &TelemetryFrame) -> Result<usize> {
        self.buf.clear();
        frame.encode(&mut self.buf)?;
        self.flush_buf()
    }

    /// Write one command token followed by a newline (server side).
    pub fn send_command(&mut self, directive: Directive) -> Result<usize> {
        self.send_raw(directive.as_str().as_bytes())
    }

    /// Write raw text followed by a newline.
    pub fn send_raw(&mut self, line: &[u8]) -> Result<usize> {
        self.buf.clear();
        self.buf.extend_from_slice(line);
        self.buf.extend_from_slice(&[DELIMITER]);
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> Result<usize> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        Ok(offset)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<LinkStream> {
    /// Create a frame writer for `LinkStream` and apply write timeout from config.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
