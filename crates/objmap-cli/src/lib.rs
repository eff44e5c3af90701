mod config;
mod generate;
mod report;

pub use config::{load_config, DEFAULT_CONFIG_FILE};
pub use generate::GenerateCommand;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;

/// Parse and execute CLI commands from command-line arguments
pub fn parse_and_run() -> Result<ExitCode> {
    run(Cli::parse())
}

/// Parse and execute CLI commands from an iterator of arguments
pub fn parse_from<I, T>(args: I) -> Result<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    run(Cli::parse_from(args))
}

fn run(cli: Cli) -> Result<ExitCode> {
    init_tracing(cli.verbose);

    match cli.command {
        Command::Generate(cmd) => cmd.run(),
    }
}

/// Logs to stderr so generated code on stdout stays clean.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Fails when a subscriber is already installed, e.g. across test runs
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(name = "objmap")]
#[command(about = "objmap - object mapping code generator")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Generate mapping functions for the requests in a source file
    Generate(GenerateCommand),
}
