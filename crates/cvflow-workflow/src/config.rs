use std::time::Duration;

use cvflow_types::{ActionId, StudioId};

/// Default deadline for a single platform round trip, including the wait
/// for a build or submit response.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for one change control to finish executing.
pub const CC_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a workflow run against one studio.
#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    /// The studio whose inputs are being changed.
    pub studio_id: StudioId,
    /// Autofill action to generate inputs with, when one is installed.
    pub action_id: Option<ActionId>,
    pub rpc_timeout: Duration,
    pub cc_timeout: Duration,
}

impl WorkflowConfig {
    pub fn new(studio_id: StudioId) -> Self {
        Self {
            studio_id,
            action_id: None,
            rpc_timeout: RPC_TIMEOUT,
            cc_timeout: CC_TIMEOUT,
        }
    }

    pub fn with_action(mut self, action_id: ActionId) -> Self {
        self.action_id = Some(action_id);
        self
    }
}
