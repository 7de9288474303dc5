pub mod filter;
pub mod kinds;
pub mod replay;

use anyhow::{Context, Result};
use blox_core::{Event, EventRegistry};
use serde_json::Value;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Workspace id used for records that do not name one.
pub const DEFAULT_WORKSPACE: &str = "main";

/// Read a JSON-lines change log. `-` reads stdin. Blank lines and lines
/// starting with `#` are skipped.
pub fn read_log(path: &Path) -> Result<Vec<Value>> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(trimmed)
            .with_context(|| format!("{}:{}: invalid JSON", path.display(), line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Decode every record, routing each to its `workspaceId` or `fallback`.
pub fn decode_log(
    records: &[Value],
    registry: &EventRegistry,
    fallback: &str,
) -> Result<Vec<Event>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let workspace_id = record
                .get("workspaceId")
                .and_then(Value::as_str)
                .unwrap_or(fallback);
            registry.decode(record, workspace_id).map_err(|err| {
                let hint = err.hint().map(|h| format!(" ({h})")).unwrap_or_default();
                anyhow::anyhow!("record {}: [{}] {err}{hint}", i + 1, err.code().code())
            })
        })
        .collect()
}
