use std::io::{BufRead, ErrorKind};
use std::thread;
use std::time::Duration;

use robolink_frame::{Directive, FrameConfig, FrameError, FrameReader, FrameWriter};
use robolink_session::StopHandle;
use robolink_transport::{LinkListener, LinkStream};
use tracing::{debug, info, warn};

use crate::cmd::{install_ctrlc_handler, ServeArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_telemetry, OutputFormat};

/// How often the receive loop wakes up to check for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let initial = parse_tokens(&args.command)?;

    let addr = args.link.addr();
    let listener = LinkListener::bind(&addr).map_err(|err| transport_error("bind failed", err))?;
    info!(addr = %listener.local_addr(), "waiting for robot");

    let stream = listener
        .accept()
        .map_err(|err| transport_error("accept failed", err))?;
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    info!(%peer, "robot connected");

    let stop = StopHandle::new();
    install_ctrlc_handler(stop.clone())?;

    let mut writer = FrameWriter::new(
        stream
            .try_clone()
            .map_err(|err| transport_error("clone failed", err))?,
    );
    for directive in initial {
        writer
            .send_command(directive)
            .map_err(|err| frame_error("command send failed", err))?;
        info!(%directive, "command sent");
    }
    spawn_stdin_forwarder(writer)?;

    let result = receive_loop(&stream, &peer, args.count, &stop, format);
    if let Err(err) = stream.shutdown() {
        debug!(error = %err, "shutdown after serve");
    }
    result
}

fn receive_loop(
    stream: &LinkStream,
    peer: &str,
    count: Option<usize>,
    stop: &StopHandle,
    format: OutputFormat,
) -> CliResult<i32> {
    let config = FrameConfig {
        read_timeout: Some(POLL_INTERVAL),
        ..FrameConfig::default()
    };
    let reader_stream = stream
        .try_clone()
        .map_err(|err| transport_error("clone failed", err))?;
    let mut reader = FrameReader::with_config_link(reader_stream, config)
        .map_err(|err| frame_error("reader setup failed", err))?;

    let mut printed = 0usize;
    while stop.is_running() {
        let frame = match reader.read_telemetry() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => {
                info!(%peer, "robot disconnected");
                break;
            }
            Err(FrameError::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                continue;
            }
            Err(
                err @ (FrameError::Json(_) | FrameError::NotAnObject | FrameError::InvalidUtf8(_)),
            ) => {
                warn!(error = %err, "dropping malformed telemetry line");
                continue;
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        print_telemetry(&frame, peer, format);
        printed = printed.saturating_add(1);
        if count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    Ok(SUCCESS)
}

/// Forward command tokens typed on stdin, one per line.
fn spawn_stdin_forwarder(mut writer: FrameWriter<LinkStream>) -> CliResult<()> {
    thread::Builder::new()
        .name("robolink-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(directive) = Directive::parse_token(&line) else {
                    warn!(token = line.trim(), "not a command token; expected one of FORWARD, BACKWARD, LEFT, RIGHT, STOP");
                    continue;
                };
                if let Err(err) = writer.send_command(directive) {
                    warn!(error = %err, "command send failed; stdin forwarding stopped");
                    break;
                }
                info!(%directive, "command sent");
            }
        })
        .map(|_| ())
        .map_err(|err| {
            CliError::new(
                crate::exit::INTERNAL,
                format!("stdin thread failed: {err}"),
            )
        })
}

fn parse_tokens(tokens: &[String]) -> CliResult<Vec<Directive>> {
    tokens
        .iter()
        .map(|token| {
            Directive::parse_token(token)
                .ok_or_else(|| CliError::usage(format!("unknown command token: {token}")))
        })
        .collect()
}
