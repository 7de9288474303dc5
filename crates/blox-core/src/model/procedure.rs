//! Procedure models and the workspace procedure map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterModel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureModel {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterModel>,
    /// `None` for procedures without a return value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_types: Option<Vec<String>>,
}

const fn default_true() -> bool {
    true
}

impl ProcedureModel {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            parameters: Vec::new(),
            return_types: None,
        }
    }

    #[must_use]
    pub fn parameter(&self, id: &str) -> Option<(usize, &ParameterModel)> {
        self.parameters.iter().enumerate().find(|(_, p)| p.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureMap {
    procedures: BTreeMap<String, ProcedureModel>,
}

impl ProcedureMap {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProcedureModel> {
        self.procedures.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.procedures.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcedureModel> {
        self.procedures.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    pub(crate) fn insert(&mut self, model: ProcedureModel) {
        self.procedures.insert(model.id.clone(), model);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<ProcedureModel> {
        self.procedures.remove(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ProcedureModel> {
        self.procedures.get_mut(id)
    }
}
