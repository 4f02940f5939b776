use dsmrp1_transport::{DEFAULT_BAUD_RATE, DEFAULT_DEVICE};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("dsmrp1 {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: dsmrp1");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("DSMRP1_BUILD_TARGET"));
    println!("default_device: {DEFAULT_DEVICE}");
    println!("default_baud: {DEFAULT_BAUD_RATE}");
    println!(
        "features: serial={}, async={}, cli=true",
        cfg!(feature = "serial"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
