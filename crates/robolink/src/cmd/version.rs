use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("robolink {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("ROBOLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("os: {}", std::env::consts::OS);
    println!("arch: {}", std::env::consts::ARCH);
    println!("features: http={}", cfg!(feature = "http"));
    println!(
        "defaults: {}:{} every {}ms",
        robolink_session::config::DEFAULT_HOST,
        robolink_session::config::DEFAULT_PORT,
        robolink_session::config::DEFAULT_PERIOD.as_millis()
    );

    Ok(SUCCESS)
}
