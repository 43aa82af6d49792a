use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cvflow_types::{ActionId, RequestId};

/// Executes a platform action with dynamic string arguments.
///
/// Used by the autofill flow: the action reads its target studio,
/// workspace, and input path from `args` and writes the generated inputs
/// itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionExecConfig {
    pub action_id: ActionId,
    pub exec_id: RequestId,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl ActionExecConfig {
    pub fn new(action_id: ActionId) -> Self {
        Self { action_id, exec_id: RequestId::random(), args: BTreeMap::new() }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}
