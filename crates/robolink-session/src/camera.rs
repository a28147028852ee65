//! Camera seam and the IMAGE frame source.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use robolink_frame::{ImagePayload, TelemetryFrame};
use tracing::{debug, warn};

use crate::error::SensorError;
use crate::session::FrameSource;

/// Default interval between IMAGE frames (about 30 frames per second).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 30);

const FPS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// One JPEG-encoded capture.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
}

/// A camera that yields JPEG-encoded frames.
pub trait ImageSource: Send {
    /// Capture and encode one frame.
    fn capture(&mut self) -> Result<CapturedImage, SensorError>;
}

impl<C: ImageSource + ?Sized> ImageSource for Box<C> {
    fn capture(&mut self) -> Result<CapturedImage, SensorError> {
        (**self).capture()
    }
}

/// Turns camera captures into IMAGE frames.
///
/// A failed capture skips the cycle rather than sending an empty frame.
pub struct ImageStream<C> {
    camera: C,
    captured: u64,
    window_start: Instant,
    window_frames: u32,
}

impl<C: ImageSource> ImageStream<C> {
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            captured: 0,
            window_start: Instant::now(),
            window_frames: 0,
        }
    }

    /// Frames captured successfully so far.
    pub fn captured(&self) -> u64 {
        self.captured
    }

    pub fn into_inner(self) -> C {
        self.camera
    }

    fn note_frame(&mut self) {
        self.captured += 1;
        self.window_frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= FPS_LOG_INTERVAL {
            let fps = f64::from(self.window_frames) / elapsed.as_secs_f64();
            debug!(fps = %format!("{fps:.1}"), "camera frame rate");
            self.window_start = Instant::now();
            self.window_frames = 0;
        }
    }
}

impl<C: ImageSource> FrameSource for ImageStream<C> {
    fn next_frame(&mut self) -> Option<TelemetryFrame> {
        let image = match self.camera.capture() {
            Ok(image) => image,
            Err(err) => {
                warn!(error = %err, "camera capture failed; skipping frame");
                return None;
            }
        };
        self.note_frame();

        Some(TelemetryFrame::image(&ImagePayload {
            jpeg: image.jpeg,
            width: image.width,
            height: image.height,
            timestamp: unix_timestamp(),
        }))
    }
}

/// Seconds since the Unix epoch with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
