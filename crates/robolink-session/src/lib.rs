//! Robot side of the control link.
//!
//! A [`LinkSession`] holds one TCP connection to the control server and runs
//! two duties over it: commands in (decoded and handed to an [`Actuator`])
//! and telemetry out (gathered from a [`FrameSource`] every period).
//!
//! ```no_run
//! use robolink_session::{sim, LinkConfig, LinkSession};
//!
//! let config = LinkConfig::new("192.168.0.19", 6000);
//! let session = LinkSession::connect(&config, sim::LoggingActuator::default())?;
//! let mut sensors = sim::demo_sensors();
//! session.run(&mut sensors)?;
//! # Ok::<(), robolink_session::SessionError>(())
//! ```

pub mod actuator;
pub mod camera;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod receive;
pub mod sensor;
pub mod session;
pub mod sim;

pub use actuator::Actuator;
pub use camera::{CapturedImage, ImageSource, ImageStream};
pub use config::LinkConfig;
pub use error::{Result, SensorError, SessionError};
#[cfg(feature = "http")]
pub use http::{run_http, HttpConfig, HttpReport, HttpSink, PostOutcome};
pub use receive::{run_receive, ReceiveEnd};
pub use sensor::{SensorSet, SensorSource};
pub use session::{FrameSource, LinkSession, SessionReport, SessionState, StopHandle};
