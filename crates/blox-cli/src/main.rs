#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "blox: inspect, merge, and replay block editor change logs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "List registered event kinds",
        after_help = "EXAMPLES:\n    # Show every kind and whether it is a UI event\n    blox kinds\n\n    # Machine-readable\n    blox kinds --json"
    )]
    Kinds(cmd::kinds::KindsArgs),

    #[command(
        about = "Merge a change log the way the dispatcher would before delivery",
        after_help = "EXAMPLES:\n    # Collapse drag ticks in a recorded session\n    blox filter session.jsonl\n\n    # Merge in undo order\n    blox filter session.jsonl --backward"
    )]
    Filter(cmd::filter::FilterArgs),

    #[command(
        about = "Replay a change log onto an in-memory workspace and print the result",
        after_help = "EXAMPLES:\n    # Rebuild a document from its change log\n    blox replay session.jsonl\n\n    # Start from a saved document and undo the last two actions\n    blox replay session.jsonl --state doc.json --undo 2"
    )]
    Replay(cmd::replay::ReplayArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BLOX_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "blox=debug,info"
        } else {
            "blox=info,warn"
        })
    });

    let format = env::var("BLOX_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, "starting");

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Kinds(ref args) => cmd::kinds::run_kinds(args, output),
        Commands::Filter(ref args) => cmd::filter::run_filter(args, output),
        Commands::Replay(ref args) => cmd::replay::run_replay(args, output, &project_root),
    }
}
