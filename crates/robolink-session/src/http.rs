//! HTTP telemetry variant: one `POST` per cycle instead of a socket stream.

use std::thread;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use robolink_frame::encode_frame;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::sensor::SensorSet;
use crate::session::StopHandle;

/// Default per-request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(1);

/// Where and how telemetry is posted.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub url: String,
    pub timeout: Duration,
}

impl HttpConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Result of one accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The server answered 200.
    Delivered { bytes: usize },
    /// The server answered with any other status.
    Rejected { status: u16 },
}

/// Counters for a finished [`run_http`] loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpReport {
    pub delivered: u64,
    pub rejected: u64,
    pub failed: u64,
}

/// Posts telemetry maps to a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(config.url.clone(), config.timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post one telemetry map. No retry.
    pub fn post(&self, map: &Map<String, Value>) -> Result<PostOutcome> {
        let mut body = BytesMut::new();
        encode_frame(map, &mut body)?;
        body.truncate(body.len().saturating_sub(1));
        let bytes = body.len();

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(PostOutcome::Delivered { bytes })
        } else {
            Ok(PostOutcome::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

/// Gather and post every `period` until `stop` is triggered.
///
/// A rejected or failed post is logged and the loop carries on.
pub fn run_http(
    sink: &HttpSink,
    sensors: &mut SensorSet,
    period: Duration,
    stop: &StopHandle,
) -> HttpReport {
    let mut report = HttpReport::default();
    let mut next_tick = Instant::now();
    info!(url = sink.url(), period_ms = period.as_millis() as u64, "http telemetry started");

    while stop.is_running() {
        let frame = sensors.gather();
        match sink.post(frame.fields()) {
            Ok(PostOutcome::Delivered { bytes }) => {
                report.delivered += 1;
                debug!(bytes, "telemetry posted");
            }
            Ok(PostOutcome::Rejected { status }) => {
                report.rejected += 1;
                warn!(status, "telemetry post rejected");
            }
            Err(err) => {
                report.failed += 1;
                warn!(error = %err, "telemetry post failed");
            }
        }

        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            next_tick = now;
        }
    }

    info!(
        delivered = report.delivered,
        rejected = report.rejected,
        failed = report.failed,
        "http telemetry stopped"
    );
    report
}
