//! docmark CLI - Documentation markup compiler.
//!
//! Provides commands for:
//! - `convert`: Convert a documentation source into component markup
//! - `outline`: Print the heading outline of a documentation source

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertArgs, OutlineArgs};
use error::CliError;
use output::Output;

/// docmark - Documentation markup compiler.
#[derive(Parser)]
#[command(name = "docmark", version, about)]
struct Cli {
    /// Enable verbose output (pass timings and soft-degrade notices).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a documentation source into component markup.
    Convert(ConvertArgs),
    /// Print the heading outline as JSON.
    Outline(OutlineArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli.command, &output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(command: Commands, output: &Output) -> Result<(), CliError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    match command {
        Commands::Convert(args) => rt.block_on(args.execute(output)),
        Commands::Outline(args) => rt.block_on(args.execute(output)),
    }
}
