//! TCP transport for the robot control link.
//!
//! This is the lowest layer of robolink. It opens the single persistent
//! connection between the robot and its control server and hands out the
//! [`LinkStream`] handle everything else reads from and writes to.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use tcp::{connect, connect_timeout, LinkListener};
