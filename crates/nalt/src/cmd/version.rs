use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("nalt {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: nalt");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    match nalt_schema::VersionRegistry::builtin() {
        Ok(registry) => {
            let versions: Vec<String> = registry.order().iter().map(ToString::to_string).collect();
            println!("protocol_versions: {}", versions.join(", "));
        }
        Err(err) => println!("protocol_versions: unavailable ({err})"),
    }

    Ok(SUCCESS)
}
