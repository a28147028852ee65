//! Simulated hardware for bench runs and tests.
//!
//! Every simulated sensor is deterministic: its value depends only on how
//! many times it has been read. [`demo_sensors`] assembles the set the CLI
//! reports by default, in the same order as the robot's own telemetry.

use std::sync::{Arc, Mutex, PoisonError};

use bytes::{BufMut, Bytes, BytesMut};
use robolink_frame::Reading;
use tracing::{debug, info};

use crate::actuator::{Actuator, DEFAULT_SPEED};
use crate::camera::{CapturedImage, ImageSource};
use crate::error::SensorError;
use crate::sensor::{SensorSet, SensorSource};

/// Volts per ppm of the CO2 probe's analogue output.
pub const CO2_VOLTS_PER_PPM: f64 = 0.0004;

const ADC_MAX: f64 = 4095.0;
const ADC_REF_VOLTS: f64 = 3.3;

/// Always reports the same reading.
#[derive(Debug, Clone)]
pub struct FixedSensor {
    name: String,
    reading: Reading,
}

impl FixedSensor {
    pub fn new(name: impl Into<String>, reading: impl Into<Reading>) -> Self {
        Self {
            name: name.into(),
            reading: reading.into(),
        }
    }
}

impl SensorSource for FixedSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        Ok(self.reading.clone())
    }
}

/// A sensor that is configured but not plugged in.
#[derive(Debug, Clone)]
pub struct FailingSensor {
    name: String,
}

impl FailingSensor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SensorSource for FailingSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        Err(SensorError::NotConnected)
    }
}

/// Flame detector: quiet except for one flicker every `period` reads.
#[derive(Debug, Clone)]
pub struct FlameSim {
    reads: u64,
    period: u64,
}

impl FlameSim {
    pub fn new(period: u64) -> Self {
        Self {
            reads: 0,
            period: period.max(1),
        }
    }
}

impl SensorSource for FlameSim {
    fn name(&self) -> &str {
        "flame"
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        self.reads += 1;
        Ok(Reading::Flag(self.reads % self.period == 0))
    }
}

/// Motion detector that toggles on every read.
#[derive(Debug, Clone, Default)]
pub struct PirSim {
    motion: bool,
}

impl SensorSource for PirSim {
    fn name(&self) -> &str {
        "pir"
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        let reading = Reading::Flag(self.motion);
        self.motion = !self.motion;
        Ok(reading)
    }
}

/// Particulate sensor whose PM values drift inside a plausible indoor band.
#[derive(Debug, Clone)]
pub struct DustSim {
    pm_2p5: f64,
    pm_10: f64,
    reads: u64,
}

impl Default for DustSim {
    fn default() -> Self {
        Self {
            pm_2p5: 18.0,
            pm_10: 28.0,
            reads: 0,
        }
    }
}

impl SensorSource for DustSim {
    fn name(&self) -> &str {
        "dust"
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        let reading = Reading::group([
            ("status", Reading::Integer(0)),
            ("mode", Reading::Integer(0)),
            ("pm_2p5_grimm", Reading::Number(self.pm_2p5)),
            ("pm_10_grimm", Reading::Number(self.pm_10)),
        ]);

        self.reads += 1;
        let step = if (self.reads / 4) % 2 == 0 { 0.5 } else { -0.5 };
        self.pm_2p5 = (self.pm_2p5 + step).clamp(12.0, 35.0);
        self.pm_10 = (self.pm_10 + step * 1.5).clamp(18.0, 50.0);
        Ok(reading)
    }
}

/// Analogue CO2 probe: raw ADC count, volts and derived ppm.
#[derive(Debug, Clone)]
pub struct Co2Sim {
    volt: f64,
    reads: u64,
}

impl Default for Co2Sim {
    fn default() -> Self {
        Self {
            volt: 0.18,
            reads: 0,
        }
    }
}

impl Co2Sim {
    fn sample_volt(&self) -> f64 {
        // +-4 mV ripple around the baseline.
        let offset = (self.reads % 5) as f64 - 2.0;
        self.volt + offset * 0.002
    }
}

impl SensorSource for Co2Sim {
    fn name(&self) -> &str {
        "co2"
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        let volt = self.sample_volt();
        self.reads += 1;
        let raw = (volt / ADC_REF_VOLTS * ADC_MAX).round() as i64;
        Ok(Reading::group([
            ("raw", Reading::Integer(raw)),
            ("volt", Reading::Number(volt)),
            ("ppm", Reading::Number(volt / CO2_VOLTS_PER_PPM)),
        ]))
    }
}

/// The default bench sensor set: flame, pir, dust, co2, ultrasonic.
///
/// The ultrasonic array has no driver and always reports `null`.
pub fn demo_sensors() -> SensorSet {
    SensorSet::new()
        .with(FlameSim::new(20))
        .with(PirSim::default())
        .with(DustSim::default())
        .with(Co2Sim::default())
        .with(FixedSensor::new("ultrasonic", Reading::Absent))
}

/// Actuator that only logs each call. Used for long-running bench sessions.
#[derive(Debug, Clone, Copy)]
pub struct LoggingActuator {
    speed: u8,
}

impl Default for LoggingActuator {
    fn default() -> Self {
        Self::with_speed(DEFAULT_SPEED)
    }
}

impl LoggingActuator {
    pub fn with_speed(speed: u8) -> Self {
        Self { speed }
    }
}

impl Actuator for LoggingActuator {
    fn forward(&mut self) {
        info!(speed = self.speed, "drive forward");
    }

    fn backward(&mut self) {
        info!(speed = self.speed, "drive backward");
    }

    fn move_towards(&mut self, angle: u16, speed: u8) {
        info!(angle, speed, "drive towards heading");
    }

    fn stop(&mut self) {
        info!("drive stop");
    }

    fn speed(&self) -> u8 {
        self.speed
    }
}

/// One call received by a [`RecordingActuator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Forward,
    Backward,
    Move { angle: u16, speed: u8 },
    Stop,
}

/// Actuator that logs and records every call instead of driving motors.
///
/// Clones share one journal, so a test can keep a clone while the session
/// owns the other.
#[derive(Debug, Clone)]
pub struct RecordingActuator {
    journal: Arc<Mutex<Vec<Motion>>>,
    speed: u8,
}

impl Default for RecordingActuator {
    fn default() -> Self {
        Self::with_speed(DEFAULT_SPEED)
    }
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speed(speed: u8) -> Self {
        Self {
            journal: Arc::new(Mutex::new(Vec::new())),
            speed,
        }
    }

    /// Calls recorded so far, oldest first.
    pub fn motions(&self) -> Vec<Motion> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, motion: Motion) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(motion);
    }
}

impl Actuator for RecordingActuator {
    fn forward(&mut self) {
        info!(speed = self.speed, "drive forward");
        self.record(Motion::Forward);
    }

    fn backward(&mut self) {
        info!(speed = self.speed, "drive backward");
        self.record(Motion::Backward);
    }

    fn move_towards(&mut self, angle: u16, speed: u8) {
        info!(angle, speed, "drive towards heading");
        self.record(Motion::Move { angle, speed });
    }

    fn stop(&mut self) {
        info!("drive stop");
        self.record(Motion::Stop);
    }

    fn speed(&self) -> u8 {
        self.speed
    }
}

/// Camera that produces small placeholder JPEG payloads.
///
/// Each payload is a JPEG start marker, a big-endian frame counter and an
/// end marker, which is enough to tell frames apart on the server side.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    frames: u32,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl ImageSource for SyntheticCamera {
    fn capture(&mut self) -> Result<CapturedImage, SensorError> {
        self.frames = self.frames.wrapping_add(1);

        let mut jpeg = BytesMut::with_capacity(8);
        jpeg.put_slice(&[0xFF, 0xD8]);
        jpeg.put_u32(self.frames);
        jpeg.put_slice(&[0xFF, 0xD9]);
        debug!(frame = self.frames, "synthetic capture");

        Ok(CapturedImage {
            jpeg: Bytes::from(jpeg),
            width: self.width,
            height: self.height,
        })
    }
}
