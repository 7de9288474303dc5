//! Procedure and parameter payloads.
//!
//! Unlike the other families, replaying against a missing procedure is a hard
//! error: the procedure map and the change log have diverged.

use crate::error::EventError;
use crate::model::procedure::{ParameterModel, ProcedureModel};
use crate::model::Workspace;
use serde::{Deserialize, Serialize};

fn require_procedure(ws: &Workspace, id: &str) -> Result<(), EventError> {
    if ws.procedure_map().contains(id) {
        Ok(())
    } else {
        Err(EventError::ProcedureNotFound(id.to_string()))
    }
}

fn require_parameter(ws: &Workspace, procedure_id: &str, parameter_id: &str) -> Result<usize, EventError> {
    ws.procedure_map()
        .get(procedure_id)
        .ok_or_else(|| EventError::ProcedureNotFound(procedure_id.to_string()))?
        .parameter(parameter_id)
        .map(|(index, _)| index)
        .ok_or_else(|| EventError::ParameterNotFound {
            procedure: procedure_id.to_string(),
            parameter: parameter_id.to_string(),
        })
}

/// Payload shared by procedure create and delete: a snapshot of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureSnapshot {
    pub procedure: ProcedureModel,
}

impl ProcedureSnapshot {
    fn insert(&self, ws: &mut Workspace) -> Result<(), EventError> {
        if ws.procedure_map().contains(&self.procedure.id) {
            return Ok(());
        }
        ws.add_procedure(self.procedure.clone())
    }

    fn remove(&self, ws: &mut Workspace) {
        ws.delete_procedure(&self.procedure.id);
    }

    pub(crate) fn run_create(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward {
            self.insert(ws)
        } else {
            self.remove(ws);
            Ok(())
        }
    }

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
pub struct ProcedureRename {
    pub procedure_id: String,
    pub old_name: String,
    pub new_name: String,
}

impl ProcedureRename {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_name == self.new_name
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        require_procedure(ws, &self.procedure_id)?;
        let name = if forward { &self.new_name } else { &self.old_name };
        ws.rename_procedure(&self.procedure_id, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureEnable {
    pub procedure_id: String,
    pub new_state: bool,
}

impl ProcedureEnable {
    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        require_procedure(ws, &self.procedure_id)?;
        let enabled = if forward { self.new_state } else { !self.new_state };
        ws.set_procedure_enabled(&self.procedure_id, enabled)
    }
}

/// Payload shared by parameter create and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSnapshot {
    pub procedure_id: String,
    pub parameter: ParameterModel,
    pub index: usize,
}

impl ParameterSnapshot {
    fn insert(&self, ws: &mut Workspace) -> Result<(), EventError> {
        require_procedure(ws, &self.procedure_id)?;
        if require_parameter(ws, &self.procedure_id, &self.parameter.id).is_ok() {
            return Ok(());
        }
        ws.insert_parameter(&self.procedure_id, self.parameter.clone(), self.index)
    }

    fn remove(&self, ws: &mut Workspace) -> Result<(), EventError> {
        let index = require_parameter(ws, &self.procedure_id, &self.parameter.id)?;
        ws.delete_parameter(&self.procedure_id, index)
    }

    pub(crate) fn run_create(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward { self.insert(ws) } else { self.remove(ws) }
    }

    pub(crate) fn run_delete(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward { self.remove(ws) } else { self.insert(ws) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRename {
    pub procedure_id: String,
    pub parameter_id: String,
    pub old_name: String,
    pub new_name: String,
}

impl ParameterRename {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_name == self.new_name
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        require_parameter(ws, &self.procedure_id, &self.parameter_id)?;
        let name = if forward { &self.new_name } else { &self.old_name };
        ws.rename_parameter(&self.procedure_id, &self.parameter_id, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReturn {
    pub procedure_id: String,
    #[serde(default)]
    pub old_types: Option<Vec<String>>,
    #[serde(default)]
    pub new_types: Option<Vec<String>>,
}

impl ChangeReturn {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_types == self.new_types
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        require_procedure(ws, &self.procedure_id)?;
        let types = if forward { &self.new_types } else { &self.old_types };
        ws.set_return_types(&self.procedure_id, types.clone())
    }
}
