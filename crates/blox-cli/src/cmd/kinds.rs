//! `blox kinds`: list the event kinds the decoder understands.

use crate::output::{OutputMode, pretty_section, render};
use blox_core::{EventKind, EventRegistry};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct KindsArgs {
    /// Only list UI kinds.
    #[arg(long, conflicts_with = "model")]
    pub ui: bool,

    /// Only list kinds that change the document.
    #[arg(long)]
    pub model: bool,
}

#[derive(Debug, Serialize)]
struct KindRow {
    kind: String,
    ui: bool,
    /// Recorded for undo unless the event says otherwise.
    undoable: bool,
}

fn rows(registry: &EventRegistry) -> Vec<KindRow> {
    registry
        .kinds()
        .filter_map(|kind| kind.parse::<EventKind>().ok())
        .map(|kind| KindRow {
            kind: kind.as_str().to_string(),
            ui: kind.is_ui(),
            undoable: kind.records_undo(),
        })
        .collect()
}

pub fn run_kinds(args: &KindsArgs, output: OutputMode) -> anyhow::Result<()> {
    let registry = EventRegistry::with_builtins();
    let rows: Vec<KindRow> = rows(&registry)
        .into_iter()
        .filter(|row| !(args.ui && !row.ui) && !(args.model && row.ui))
        .collect();

    render(output, &rows, |rows, w| {
        pretty_section(w, &format!("{} event kinds", rows.len()))?;
        for row in rows {
            let family = if row.ui { "ui" } else { "model" };
            let undo = if row.undoable { "undo" } else { "" };
            writeln!(w, "{:<34} {family:<6} {undo}", row.kind)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_is_listed_once() {
        let rows = rows(&EventRegistry::with_builtins());
        assert_eq!(rows.len(), EventKind::ALL.len());
        let drag = rows.iter().find(|r| r.kind == "drag").expect("drag");
        assert!(drag.ui);
        assert!(!drag.undoable);
        let create = rows.iter().find(|r| r.kind == "create").expect("create");
        assert!(create.undoable);
    }
}
