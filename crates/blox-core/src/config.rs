use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine and history tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Undo stack depth per workspace. `0` disables undo recording.
    #[serde(default = "default_max_undo")]
    pub max_undo: usize,
    /// Upper bound on flush generations processed by one `run_until_idle`.
    #[serde(default = "default_max_flush_rounds")]
    pub max_flush_rounds: usize,
    /// Install the orphan-disabling listener on new workspaces.
    #[serde(default)]
    pub disable_orphans: bool,
    /// Length of generated group and block ids.
    #[serde(default = "default_group_id_len")]
    pub group_id_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_undo: default_max_undo(),
            max_flush_rounds: default_max_flush_rounds(),
            disable_orphans: false,
            group_id_len: default_group_id_len(),
        }
    }
}

const fn default_max_undo() -> usize {
    1024
}

const fn default_max_flush_rounds() -> usize {
    64
}

const fn default_group_id_len() -> usize {
    20
}

fn read_config(path: &Path) -> Result<Option<EngineConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EngineConfig>(&content)
        .map(Some)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// `.blox/config.toml` under `project_root`, if present.
pub fn load_project_config(project_root: &Path) -> Result<Option<EngineConfig>> {
    read_config(&project_root.join(".blox/config.toml"))
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("blox/config.toml"))
}

/// `<config_dir>/blox/config.toml`, if present.
pub fn load_user_config() -> Result<Option<EngineConfig>> {
    match user_config_path() {
        Some(path) => read_config(&path),
        None => Ok(None),
    }
}

/// Project config wins over user config; defaults fill in when neither exists.
pub fn resolve_config(project_root: &Path) -> Result<EngineConfig> {
    if let Some(config) = load_project_config(project_root)? {
        return Ok(config);
    }
    Ok(load_user_config()?.unwrap_or_default())
}
