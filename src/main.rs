//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use builddesc::{cli::Cli, runner};
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let max_level = if cli.debug {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    fmt()
        .with_max_level(max_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
    let invocation = runner::invocation_line(std::env::args_os());
    match runner::run(&cli, &invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
