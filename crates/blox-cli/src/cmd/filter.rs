//! `blox filter`: merge a recorded change log the way the dispatcher does
//! before delivery, and print the surviving events.

use super::{DEFAULT_WORKSPACE, decode_log, read_log};
use crate::output::OutputMode;
use anyhow::Result;
use blox_core::engine::filter;
use blox_core::EventRegistry;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// JSON-lines change log (`-` for stdin).
    pub log: PathBuf,

    /// Merge in undo order (newest first), as an undo batch would be.
    #[arg(long)]
    pub backward: bool,

    /// Workspace id for records without a `workspaceId`.
    #[arg(long, default_value = DEFAULT_WORKSPACE)]
    pub workspace: String,
}

#[derive(Debug, Serialize)]
struct FilterReport {
    input: usize,
    output: usize,
    events: Vec<Value>,
}

pub fn run_filter(args: &FilterArgs, output: OutputMode) -> Result<()> {
    let registry = EventRegistry::with_builtins();
    let records = read_log(&args.log)?;
    let events = decode_log(&records, &registry, &args.workspace)?;
    let input = events.len();

    let merged = filter(events, !args.backward);
    let events = merged
        .iter()
        .map(blox_core::Event::to_json)
        .collect::<Result<Vec<_>, _>>()?;
    info!(input, output = events.len(), backward = args.backward, "filtered change log");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if output.is_json() {
        let report = FilterReport {
            input,
            output: events.len(),
            events,
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        for event in &events {
            serde_json::to_writer(&mut out, event)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
