//! Receive duty: socket chunks in, actuator calls out.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use robolink_frame::decode_commands;
use tracing::{debug, info, warn};

use crate::actuator::Actuator;

/// Why the receive duty stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveEnd {
    /// The peer closed its side (empty read).
    PeerClosed,
    /// A read failed; reception is not retried.
    ReadFailed,
    /// A chunk was not valid UTF-8; reception is not retried.
    DecodeFailed,
}

/// Clears the receiving flag however the duty exits, unwinding included.
struct ReceivingGuard(Arc<AtomicBool>);

impl Drop for ReceivingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Run the receive duty until the peer closes, a read fails or a chunk
/// cannot be decoded.
///
/// Reads at most `chunk_size` bytes at a time. Each chunk is decoded and
/// every directive it carries is applied in order. The stream is never shut
/// down from here; closing the connection belongs to the send side.
/// `receiving` is cleared on exit, even if the actuator panics.
pub fn run_receive<R, A>(
    mut reader: R,
    mut actuator: A,
    chunk_size: usize,
    receiving: Arc<AtomicBool>,
) -> ReceiveEnd
where
    R: Read,
    A: Actuator,
{
    let _guard = ReceivingGuard(receiving);
    let mut chunk = vec![0u8; chunk_size.max(1)];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => {
                info!("control server closed the connection; command reception stopped");
                return ReceiveEnd::PeerClosed;
            }
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "command read failed; command reception stopped");
                return ReceiveEnd::ReadFailed;
            }
        };

        if let Err(end) = dispatch(&chunk[..read], &mut actuator) {
            return end;
        }
    }
}

fn dispatch<A: Actuator>(raw: &[u8], actuator: &mut A) -> Result<(), ReceiveEnd> {
    let directives = match decode_commands(raw) {
        Ok(directives) => directives,
        Err(err) => {
            warn!(
                error = %err,
                bytes = raw.len(),
                "command decode failed; command reception stopped"
            );
            return Err(ReceiveEnd::DecodeFailed);
        }
    };

    if directives.is_empty() {
        debug!(
            chunk = %String::from_utf8_lossy(raw).trim(),
            "ignoring unrecognised command"
        );
        return Ok(());
    }

    for directive in directives {
        info!(%directive, "command received");
        actuator.apply(directive);
    }
    Ok(())
}
