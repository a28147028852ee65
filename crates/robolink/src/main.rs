mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "robolink", version, about = "Robot control link CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["robolink", "run"]).expect("run args should parse");
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.link.port, 6000);
        assert_eq!(args.period, "500ms");
        assert!(!args.camera);
    }

    #[test]
    fn parses_serve_with_commands() {
        let cli = Cli::try_parse_from([
            "robolink",
            "--format",
            "pretty",
            "serve",
            "--port",
            "7000",
            "--command",
            "FORWARD",
            "--command",
            "stop",
            "--count",
            "3",
        ])
        .expect("serve args should parse");

        assert_eq!(cli.format, Some(OutputFormat::Pretty));
        let Command::Serve(args) = cli.command else {
            panic!("expected serve subcommand");
        };
        assert_eq!(args.link.port, 7000);
        assert_eq!(args.command, ["FORWARD", "stop"]);
        assert_eq!(args.count, Some(3));
    }

    #[test]
    fn fps_requires_camera() {
        let err = Cli::try_parse_from(["robolink", "run", "--fps", "10"])
            .expect_err("--fps without --camera should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn post_requires_url() {
        let err = Cli::try_parse_from(["robolink", "post"]);
        if std::env::var_os("ROBOLINK_URL").is_none() {
            let err = err.expect_err("post without url should fail");
            assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["robolink", "--log-level", "loud", "version"])
            .expect_err("unknown level should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
