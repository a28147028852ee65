use std::time::Duration;

use robolink_session::sim::{demo_sensors, LoggingActuator, SyntheticCamera};
use robolink_session::{FrameSource, ImageStream, LinkConfig, LinkSession, SessionError};
use tracing::info;

use crate::cmd::{install_ctrlc_handler, parse_duration, parse_optional_duration, RunArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_session_report, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = link_config(&args)?;

    let session = LinkSession::connect(&config, LoggingActuator::with_speed(args.speed))
        .map_err(|err| session_error("connect failed", err))?;

    install_ctrlc_handler(session.stop_handle())?;

    let mut source: Box<dyn FrameSource> = if args.camera {
        info!(period_ms = config.period.as_millis() as u64, "streaming synthetic camera frames");
        Box::new(ImageStream::new(SyntheticCamera::default()))
    } else {
        Box::new(demo_sensors())
    };

    match session.run(source.as_mut()) {
        Ok(report) => {
            print_session_report(&report, format);
            Ok(SUCCESS)
        }
        Err(err @ SessionError::Write(_)) => Err(session_error("telemetry link lost", err)),
        Err(err) => Err(session_error("session failed", err)),
    }
}

fn link_config(args: &RunArgs) -> CliResult<LinkConfig> {
    let period = match (args.camera, args.fps) {
        (true, Some(0)) => return Err(CliError::usage("--fps must be greater than zero")),
        (true, Some(fps)) => Duration::from_secs(1) / fps,
        (true, None) => robolink_session::camera::DEFAULT_FRAME_INTERVAL,
        (false, _) => parse_duration(&args.period)?,
    };

    Ok(LinkConfig {
        period,
        connect_timeout: parse_optional_duration(args.connect_timeout.as_deref())?,
        write_timeout: parse_optional_duration(args.write_timeout.as_deref())?,
        ..LinkConfig::new(args.link.host.clone(), args.link.port)
    })
}
