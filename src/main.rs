//! Binary entry point: parse arguments, set up logging, dispatch.

use anyhow::Result;
use clap::Parser;

use linkctl::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    match args.command {
        cli::Command::Converge(opts) => commands::converge(&args.global, &opts),
        cli::Command::Remove(opts) => commands::remove(&args.global, &opts),
        cli::Command::Version => {
            let version = option_env!("LINKCTL_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("linkctl {version}");
            Ok(())
        }
    }
}
