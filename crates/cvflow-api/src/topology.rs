use serde::{Deserialize, Serialize};

use cvflow_types::{UpdateId, WorkspaceId};

/// Acceptance status of a topology update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    #[default]
    Unspecified,
    New,
    Accepted,
}

/// A pending device/interface topology change proposed by the platform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyUpdate {
    pub workspace_id: WorkspaceId,
    pub update_id: UpdateId,
    pub status: UpdateStatus,
}

/// Sets the acceptance status of a topology update within a workspace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyUpdateConfig {
    pub workspace_id: WorkspaceId,
    pub update_id: UpdateId,
    pub status: UpdateStatus,
}

impl TopologyUpdateConfig {
    /// Accept a pending update into the workspace.
    pub fn accept(workspace_id: WorkspaceId, update_id: UpdateId) -> Self {
        Self { workspace_id, update_id, status: UpdateStatus::Accepted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_sets_status() {
        let cfg = TopologyUpdateConfig::accept(WorkspaceId::new("ws-1"), UpdateId::new("u-1"));
        assert_eq!(cfg.status, UpdateStatus::Accepted);
    }
}
