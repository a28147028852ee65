//! Sensor seam and per-cycle gathering.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use robolink_frame::{Reading, TelemetryFrame};
use tracing::warn;

use crate::error::SensorError;
use crate::session::FrameSource;

/// A sensor that can be sampled on demand.
///
/// `read` must return within one telemetry period. What a reading looks like
/// is up to the sensor: a flag, a number, a group of sub-values.
pub trait SensorSource: Send {
    /// Key used for this sensor in telemetry frames.
    fn name(&self) -> &str;

    /// Sample the sensor once.
    fn read(&mut self) -> Result<Reading, SensorError>;
}

/// The sensors reported in every SENSOR frame, in frame order.
#[derive(Default)]
pub struct SensorSet {
    sensors: Vec<Box<dyn SensorSource>>,
}

impl SensorSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sensor (builder style).
    pub fn with(mut self, sensor: impl SensorSource + 'static) -> Self {
        self.push(Box::new(sensor));
        self
    }

    /// Add a sensor. Frame order follows insertion order.
    pub fn push(&mut self, sensor: Box<dyn SensorSource>) {
        self.sensors.push(sensor);
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Names of the configured sensors, in frame order.
    pub fn names(&self) -> Vec<&str> {
        self.sensors.iter().map(|s| s.name()).collect()
    }

    /// Read every sensor into one SENSOR frame.
    ///
    /// Each read is isolated: a sensor that errors or panics contributes
    /// `null` and the remaining sensors are still sampled.
    pub fn gather(&mut self) -> TelemetryFrame {
        let mut frame = TelemetryFrame::sensor();
        for sensor in &mut self.sensors {
            let reading = read_isolated(sensor.as_mut());
            frame.insert(sensor.name().to_string(), reading);
        }
        frame
    }
}

impl FrameSource for SensorSet {
    fn next_frame(&mut self) -> Option<TelemetryFrame> {
        Some(self.gather())
    }
}

fn read_isolated(sensor: &mut dyn SensorSource) -> Reading {
    match catch_unwind(AssertUnwindSafe(|| sensor.read())) {
        Ok(Ok(reading)) => reading,
        Ok(Err(err)) => {
            warn!(sensor = sensor.name(), error = %err, "sensor read failed");
            Reading::Absent
        }
        Err(panic) => {
            warn!(
                sensor = sensor.name(),
                error = panic_message(panic.as_ref()),
                "sensor driver panicked during read"
            );
            Reading::Absent
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
