use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cvflow_types::ChangeControlId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeControlStatus {
    #[default]
    Unspecified,
    Scheduled,
    Running,
    Completed,
}

/// Read-only state of a change control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeControl {
    pub id: ChangeControlId,
    pub status: ChangeControlStatus,
    /// Execution error text; empty or absent means the execution was clean.
    #[serde(default)]
    pub error: Option<String>,
    /// Version timestamp an approval must reference.
    pub version: DateTime<Utc>,
}

impl ChangeControl {
    /// A completed change control failed iff it carries error text.
    pub fn failed(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Approves (or revokes approval of) a change control at a given version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApproveConfig {
    pub id: ChangeControlId,
    pub approve: bool,
    pub version: DateTime<Utc>,
}

/// Flags a change control to start executing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartConfig {
    pub id: ChangeControlId,
    pub start: bool,
}
