//! fast-wireguard binary entrypoint.
//!
//! This is the main entry point for the `fwg` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fwg_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();
    match fwg_cli::run(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // `{:#}` appends each underlying cause.
            eprintln!("Error: {:#}", anyhow::Error::new(e));
            ExitCode::FAILURE
        }
    }
}
