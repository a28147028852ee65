use robolink_session::sim::demo_sensors;
use robolink_session::{run_http, HttpSink, StopHandle};

use crate::cmd::{install_ctrlc_handler, parse_duration, PostArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_http_report, OutputFormat};

pub fn run(args: PostArgs, format: OutputFormat) -> CliResult<i32> {
    let period = parse_duration(&args.period)?;
    let timeout = parse_duration(&args.timeout)?;

    let sink = HttpSink::new(args.url, timeout)
        .map_err(|err| session_error("http client setup failed", err))?;

    let stop = StopHandle::new();
    install_ctrlc_handler(stop.clone())?;

    let mut sensors = demo_sensors();
    let report = run_http(&sink, &mut sensors, period, &stop);
    print_http_report(&report, format);

    Ok(SUCCESS)
}
