//! `blox replay`: rebuild a document by applying a change log to an
//! in-memory workspace, optionally undoing the last few actions.
//!
//! Each record is applied with its own group id and undo flag in effect, so
//! the workspace history groups actions exactly as the recording editor did.
//! The engine is drained after every record.

use super::{DEFAULT_WORKSPACE, decode_log, read_log};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};
use anyhow::{Context, Result};
use blox_core::config::resolve_config;
use blox_core::model::block::BlockState;
use blox_core::{EventEngine, EventRegistry, Workspace, WorkspaceState, Workspaces};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines change log (`-` for stdin).
    pub log: PathBuf,

    /// Undo this many actions after replaying.
    #[arg(long, default_value = "0")]
    pub undo: usize,

    /// Initial document: a workspace state object or an array of block
    /// snapshots.
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Workspace id for records without a `workspaceId`.
    #[arg(long, default_value = DEFAULT_WORKSPACE)]
    pub workspace: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StateFile {
    Blocks(Vec<BlockState>),
    Workspace(WorkspaceState),
}

impl From<StateFile> for WorkspaceState {
    fn from(file: StateFile) -> Self {
        match file {
            StateFile::Workspace(state) => state,
            StateFile::Blocks(blocks) => Self {
                blocks,
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    workspace: String,
    applied: usize,
    skipped: usize,
    undone: usize,
    undo_depth: usize,
    redo_depth: usize,
    state: WorkspaceState,
}

fn load_state_file(path: &Path) -> Result<WorkspaceState> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file: StateFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(file.into())
}

pub fn run_replay(args: &ReplayArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = resolve_config(project_root)?;
    let registry = EventRegistry::with_builtins();
    let records = read_log(&args.log)?;
    let events = decode_log(&records, &registry, &args.workspace)?;

    let engine = Rc::new(EventEngine::new(config));
    let mut ws = Workspace::new(args.workspace.as_str(), Rc::clone(&engine));
    if let Some(path) = &args.state {
        let state = load_state_file(path)?;
        ws.load_state(&state)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }
    let mut workspaces = Workspaces::new();
    workspaces.insert(ws);
    engine.run_until_idle(&mut workspaces);

    let mut applied = 0;
    let mut skipped = 0;
    for (i, event) in events.iter().enumerate() {
        let Some(ws) = workspaces.get_by_id_mut(&event.workspace_id) else {
            debug!(
                record = i + 1,
                workspace_id = %event.workspace_id,
                "skipping record for other workspace"
            );
            skipped += 1;
            continue;
        };
        engine.set_group(event.group.as_str());
        let previous = engine.record_undo();
        engine.set_record_undo(previous && event.record_undo);
        let result = event.run(true, ws);
        engine.set_record_undo(previous);
        engine.set_group(false);
        result.with_context(|| format!("record {}: failed to apply {}", i + 1, event.kind_str()))?;
        engine.run_until_idle(&mut workspaces);
        applied += 1;
    }

    let mut undone = 0;
    while undone < args.undo {
        let ws = workspaces
            .get_by_id_mut(&args.workspace)
            .context("workspace disappeared during replay")?;
        if !ws.history().can_undo() {
            break;
        }
        ws.undo(false).context("undo failed")?;
        engine.run_until_idle(&mut workspaces);
        undone += 1;
    }
    let ws = workspaces
        .get_by_id(&args.workspace)
        .context("workspace disappeared during replay")?;
    info!(applied, skipped, undone, "replayed change log");

    let report = ReplayReport {
        workspace: ws.id().to_string(),
        applied,
        skipped,
        undone,
        undo_depth: ws.history().undo_stack().len(),
        redo_depth: ws.history().redo_stack().len(),
        state: ws.state(),
    };

    render(output, &report, |r, w| {
        pretty_section(w, &format!("Workspace {}", r.workspace))?;
        pretty_kv(w, "applied", r.applied.to_string())?;
        if r.skipped > 0 {
            pretty_kv(w, "skipped", r.skipped.to_string())?;
        }
        pretty_kv(w, "undone", r.undone.to_string())?;
        pretty_kv(w, "blocks", r.state.blocks.len().to_string())?;
        pretty_kv(w, "comments", r.state.comments.len().to_string())?;
        pretty_kv(w, "variables", r.state.variables.len().to_string())?;
        pretty_kv(w, "procedures", r.state.procedures.len().to_string())?;
        pretty_kv(w, "history", format!("{} undo / {} redo", r.undo_depth, r.redo_depth))?;
        writeln!(w)?;
        serde_json::to_writer_pretty(&mut *w, &r.state)?;
        writeln!(w)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> WorkspaceState {
        let file: StateFile = serde_json::from_str(text).expect("state file");
        file.into()
    }

    #[test]
    fn state_file_accepts_block_array() {
        let state = parse(r#"[{"type": "controls_if", "id": "a", "x": 10, "y": 20}]"#);
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.blocks[0].id.as_deref(), Some("a"));
        assert!(state.variables.is_empty());
    }

    #[test]
    fn state_file_accepts_workspace_object() {
        let state = parse(
            r#"{
                "variables": [{"name": "count", "type": "", "id": "v1"}],
                "blocks": [{"type": "math_number", "id": "n"}]
            }"#,
        );
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.variables.len(), 1);
    }

    #[test]
    fn missing_state_file_names_path() {
        let err = load_state_file(Path::new("/nonexistent/blox-state.json")).expect_err("missing");
        assert!(err.to_string().contains("blox-state.json"));
    }
}
