use std::process::ExitCode;

use clap::Parser;

use chunky::cli::{self, CliArgs};
use chunky::logger;

fn main() -> ExitCode {
    logger::init();
    let args = CliArgs::parse();
    cli::run(args)
}
