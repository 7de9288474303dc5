//! Variable payloads.

use crate::error::EventError;
use crate::model::variable::VariableModel;
use crate::model::Workspace;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Payload shared by variable create and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarSnapshot {
    pub var_id: String,
    #[serde(default)]
    pub var_type: String,
    pub var_name: String,
}

impl From<&VariableModel> for VarSnapshot {
    fn from(model: &VariableModel) -> Self {
        Self {
            var_id: model.id.clone(),
            var_type: model.var_type.clone(),
            var_name: model.name.clone(),
        }
    }
}

impl VarSnapshot {
    fn insert(&self, ws: &mut Workspace) -> Result<(), EventError> {
        if ws.variable_map().get_by_id(&self.var_id).is_some() {
            warn!(var_id = %self.var_id, "can't create variable that already exists");
            return Ok(());
        }
        ws.create_variable(&self.var_name, &self.var_type, Some(&self.var_id))
            .map(|_| ())
    }

    fn remove(&self, ws: &mut Workspace) {
        if !ws.delete_variable_by_id(&self.var_id) {
            warn!(var_id = %self.var_id, "can't delete non-existent variable");
        }
    }

    /// Forward replay of a `var_create`.
    pub(crate) fn run_create(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward {
            self.insert(ws)
        } else {
            self.remove(ws);
            Ok(())
        }
    }

    /// Forward replay of a `var_delete`.
    pub(crate) fn run_delete(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward {
            self.remove(ws);
            Ok(())
        } else {
            self.insert(ws)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarRename {
    pub var_id: String,
    pub old_name: String,
    pub new_name: String,
}

impl VarRename {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_name == self.new_name
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) {
        let name = if forward { &self.new_name } else { &self.old_name };
        if !ws.rename_variable_by_id(&self.var_id, name) {
            warn!(var_id = %self.var_id, "can't rename non-existent variable");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarTypeChange {
    pub var_id: String,
    pub old_type: String,
    pub new_type: String,
}

impl VarTypeChange {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_type == self.new_type
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) {
        let ty = if forward { &self.new_type } else { &self.old_type };
        if !ws.change_variable_type(&self.var_id, ty) {
            warn!(var_id = %self.var_id, "can't retype non-existent variable");
        }
    }
}
