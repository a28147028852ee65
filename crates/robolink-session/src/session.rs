//! The link session: one connection, two duties.
//!
//! ```text
//!  CONNECTING ──connect ok──▶ OPEN ──send duty ends──▶ CLOSED
//!      │                                                ▲
//!      └──────────────connect failed────────────────────┘
//! ```
//!
//! While OPEN, the receive duty runs on a detached `robolink-recv` thread
//! with its own clone of the socket, and the send duty runs on the thread
//! that called [`LinkSession::run`]. Only the send side ever shuts the socket
//! down, exactly once, whichever way it exits. The receive thread is never
//! joined: once the socket is shut down its blocked read returns and it
//! winds down on its own.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use robolink_frame::{FrameConfig, FrameWriter, TelemetryFrame};
use robolink_transport::LinkStream;
use tracing::{debug, info, trace, warn};

use crate::actuator::Actuator;
use crate::config::LinkConfig;
use crate::error::{Result, SessionError};
use crate::receive::run_receive;

/// Produces the telemetry frame for each send cycle.
pub trait FrameSource {
    /// Next frame to send, or `None` to skip this cycle.
    fn next_frame(&mut self) -> Option<TelemetryFrame>;
}

/// Lifecycle state of a [`LinkSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// Requests the send duty to stop at its next cycle.
///
/// Cheap to clone; safe to trigger from a signal handler thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// A fresh handle in the running state, for loops not tied to a session.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Ask the session to stop. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a session that ended on a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Telemetry frames written.
    pub frames_sent: u64,
    /// Telemetry bytes written, delimiters included.
    pub bytes_sent: u64,
    /// Whether the receive duty was still running when the session closed.
    pub receive_active: bool,
    /// Time spent in the send duty.
    pub uptime: Duration,
}

/// A robot-side link to the control server.
///
/// Built with [`LinkSession::connect`] (or [`LinkSession::open`] for an
/// already connected stream) and consumed by [`LinkSession::run`]: a session
/// is never reused, reconnecting means building a new one.
pub struct LinkSession {
    writer: FrameWriter<LinkStream>,
    peer: Option<SocketAddr>,
    period: Duration,
    state: SessionState,
    running: Arc<AtomicBool>,
    receiving: Arc<AtomicBool>,
}

impl LinkSession {
    /// Connect to the control server and start the receive duty.
    ///
    /// One connect attempt is made. On failure nothing is spawned and the
    /// error is returned to the caller.
    pub fn connect<A>(config: &LinkConfig, actuator: A) -> Result<Self>
    where
        A: Actuator + 'static,
    {
        let addr = config.addr();
        info!(%addr, "connecting to control server");

        let stream = robolink_transport::connect_timeout(&addr, config.connect_timeout)
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?;

        info!(%addr, "connected to control server");
        Self::open(stream, config, actuator)
    }

    /// Start the receive duty on an already connected stream.
    pub fn open<A>(stream: LinkStream, config: &LinkConfig, actuator: A) -> Result<Self>
    where
        A: Actuator + 'static,
    {
        let peer = stream.peer_addr().ok();
        stream.set_nodelay(true)?;
        let reader = stream.try_clone()?;

        let frame_config = FrameConfig {
            write_timeout: config.write_timeout,
            ..FrameConfig::default()
        };
        let writer = FrameWriter::with_config_link(stream, frame_config)?;

        let running = Arc::new(AtomicBool::new(true));
        let receiving = Arc::new(AtomicBool::new(true));

        let chunk_size = config.recv_chunk_size;
        let receive_flag = Arc::clone(&receiving);
        // Detached: the handle is dropped and the thread is never joined.
        thread::Builder::new()
            .name("robolink-recv".to_string())
            .spawn(move || run_receive(reader, actuator, chunk_size, receive_flag))
            .map_err(SessionError::Spawn)?;

        debug!(?peer, "link session open");

        Ok(Self {
            writer,
            peer,
            period: config.period,
            state: SessionState::Open,
            running,
            receiving,
        })
    }

    /// Handle for stopping the send duty from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the receive duty is still processing commands.
    pub fn is_receiving(&self) -> bool {
        self.receiving.load(Ordering::SeqCst)
    }

    /// Address of the control server, if known.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Run the send duty until stopped or until a write fails.
    ///
    /// Every period the source is asked for a frame, which is encoded and
    /// written in full. Time spent gathering and writing counts against the
    /// period. The connection is closed on every exit path. A write failure
    /// is returned as [`SessionError::Write`]; there is no reconnection.
    pub fn run(mut self, source: &mut dyn FrameSource) -> Result<SessionReport> {
        let started = Instant::now();
        let mut frames_sent = 0u64;
        let mut bytes_sent = 0u64;
        let mut next_tick = started;

        info!(period_ms = self.period.as_millis() as u64, "telemetry transmission started");

        while self.running.load(Ordering::SeqCst) {
            if let Some(frame) = source.next_frame() {
                match self.writer.write_frame(&frame) {
                    Ok(written) => {
                        frames_sent += 1;
                        bytes_sent += written as u64;
                        trace!(bytes = written, kind = frame.kind().as_str(), "telemetry frame sent");
                    }
                    Err(err) => {
                        warn!(
                            error = %err,
                            frames_sent,
                            "telemetry write failed; closing link"
                        );
                        self.close();
                        return Err(SessionError::Write(err));
                    }
                }
            }

            next_tick += self.period;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                // Overran the period; don't burst to catch up.
                next_tick = now;
            }
        }

        let receive_active = self.is_receiving();
        self.close();

        let report = SessionReport {
            frames_sent,
            bytes_sent,
            receive_active,
            uptime: started.elapsed(),
        };
        info!(
            frames_sent = report.frames_sent,
            bytes_sent = report.bytes_sent,
            "telemetry transmission stopped"
        );
        Ok(report)
    }

    /// Shut the connection down. Only the first call has any effect.
    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.running.store(false, Ordering::SeqCst);
        if let Err(err) = self.writer.get_ref().shutdown() {
            debug!(error = %err, "link shutdown reported an error");
        }
        info!(peer = ?self.peer, "link closed");
    }
}

impl Drop for LinkSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("peer", &self.peer)
            .field("state", &self.state)
            .field("period", &self.period)
            .field("receiving", &self.is_receiving())
            .finish()
    }
}
