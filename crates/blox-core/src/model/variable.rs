//! Workspace variable map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableModel {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub var_type: String,
}

/// Variables keyed by id. Names are unique per type, compared
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    variables: BTreeMap<String, VariableModel>,
}

impl VariableMap {
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&VariableModel> {
        self.variables.get(id)
    }

    #[must_use]
    pub fn get(&self, name: &str, var_type: &str) -> Option<&VariableModel> {
        self.variables
            .values()
            .find(|v| v.var_type == var_type && v.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableModel> {
        self.variables.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub(crate) fn insert(&mut self, model: VariableModel) {
        self.variables.insert(model.id.clone(), model);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<VariableModel> {
        self.variables.remove(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut VariableModel> {
        self.variables.get_mut(id)
    }
}
