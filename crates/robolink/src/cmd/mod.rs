use std::time::Duration;

use clap::{Args, Subcommand};
use robolink_session::config::{DEFAULT_HOST, DEFAULT_PORT};
use robolink_session::StopHandle;

use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod post;
pub mod run;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the robot side of the link against simulated hardware.
    Run(RunArgs),
    /// Accept one robot, print its telemetry and send it commands.
    Serve(ServeArgs),
    /// Post simulated telemetry to an HTTP endpoint every period.
    Post(PostArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Serve(args) => serve::run(args, format),
        Command::Post(args) => post::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Control server host.
    #[arg(long, env = "ROBOLINK_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Control server port.
    #[arg(long, env = "ROBOLINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl LinkArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Telemetry period (e.g. 500ms, 2s).
    #[arg(long, env = "ROBOLINK_PERIOD", default_value = "500ms")]
    pub period: String,
    /// Give up connecting after this long. Default: OS connect timeout.
    #[arg(long, value_name = "DURATION")]
    pub connect_timeout: Option<String>,
    /// Fail a telemetry write that blocks longer than this.
    #[arg(long, value_name = "DURATION")]
    pub write_timeout: Option<String>,
    /// Stream synthetic camera frames instead of sensor readings.
    #[arg(long)]
    pub camera: bool,
    /// Camera frames per second; overrides --period.
    #[arg(long, requires = "camera")]
    pub fps: Option<u32>,
    /// Drive speed reported to the simulated actuator.
    #[arg(long, default_value_t = robolink_session::actuator::DEFAULT_SPEED)]
    pub speed: u8,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Command token to send as soon as the robot connects (repeatable).
    #[arg(long = "command", value_name = "TOKEN")]
    pub command: Vec<String>,
    /// Exit after receiving N telemetry frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Endpoint receiving one POST per period.
    #[arg(long, env = "ROBOLINK_URL")]
    pub url: String,
    /// Telemetry period (e.g. 500ms, 2s).
    #[arg(long, env = "ROBOLINK_PERIOD", default_value = "500ms")]
    pub period: String,
    /// Per-request timeout.
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

pub(crate) fn parse_optional_duration(input: Option<&str>) -> CliResult<Option<Duration>> {
    input.map(parse_duration).transpose()
}

/// Stop the send loop on Ctrl-C.
pub(crate) fn install_ctrlc_handler(stop: StopHandle) -> CliResult<()> {
    ctrlc::set_handler(move || stop.stop())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
