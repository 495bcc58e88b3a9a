//! Markdrive CLI Binary
//!
//! Command-line interface for browsing and editing a remote Markdown store.

use anyhow::Context;
use clap::Parser;
use markdrive::config::ConfigLoader;
use markdrive::logging::init_logging;
use markdrive::tooling::cli::{Cli, CliContext};
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_log_overrides(&mut config);
    init_logging(Some(&config.logging), cli.log_file.as_deref())
        .context("Failed to initialise logging")?;

    let context = CliContext::new(config).context("Failed to start session")?;
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
