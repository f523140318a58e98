use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("framecast {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: framecast");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("FRAMECAST_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("FRAMECAST_GIT_HASH").unwrap_or("unknown"));
    println!(
        "protocol: magic=IMG! length=u32be max_payload={}",
        framecast_frame::MAX_PAYLOAD
    );
    println!("default_port: {}", framecast_transport::DEFAULT_PORT);

    Ok(SUCCESS)
}
