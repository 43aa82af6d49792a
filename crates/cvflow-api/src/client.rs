use async_trait::async_trait;
use tokio::sync::mpsc;

use cvflow_types::{ChangeControlId, RequestId, StudioId, WorkspaceId};

use crate::action::ActionExecConfig;
use crate::build::WorkspaceBuild;
use crate::changecontrol::{ApproveConfig, ChangeControl, StartConfig};
use crate::error::ApiResult;
use crate::studio::{AssignedTagsConfig, InputsConfig, InputsPage};
use crate::tag::DeviceTag;
use crate::topology::{TopologyUpdate, TopologyUpdateConfig, UpdateStatus};
use crate::workspace::{Workspace, WorkspaceConfig};

/// Client seam to the configuration platform.
///
/// Set/Get operations map one-to-one onto platform resource writes and
/// reads. Subscriptions deliver state snapshots in publication order until
/// the receiver is dropped; a closed channel means the server ended the
/// stream. Timeouts are the caller's concern.
#[async_trait]
pub trait CvClient: Send + Sync {
    /// Write a workspace config: create, start a build, or submit.
    async fn set_workspace_config(&self, config: WorkspaceConfig) -> ApiResult<()>;

    /// Subscribe to state snapshots of one workspace.
    async fn subscribe_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> ApiResult<mpsc::Receiver<Workspace>>;

    /// Fetch the detailed results of a finished build.
    async fn get_build(
        &self,
        workspace_id: &WorkspaceId,
        build_id: &RequestId,
    ) -> ApiResult<WorkspaceBuild>;

    /// Fetch all inputs pages of a studio, in delivery order.
    ///
    /// The pages of one document may arrive split across many records;
    /// callers reassemble them with the merge engine.
    async fn get_all_inputs(
        &self,
        studio_id: &StudioId,
        workspace_id: &WorkspaceId,
    ) -> ApiResult<Vec<InputsPage>>;

    /// Write an inputs fragment at a path.
    async fn set_inputs(&self, config: InputsConfig) -> ApiResult<()>;

    /// Assign a studio to devices by tag query.
    async fn set_assigned_tags(&self, config: AssignedTagsConfig) -> ApiResult<()>;

    /// List device-level tag assignments carrying the given label.
    async fn get_device_tags(
        &self,
        workspace_id: &WorkspaceId,
        label: &str,
    ) -> ApiResult<Vec<DeviceTag>>;

    /// Execute a platform action.
    async fn exec_action(&self, config: ActionExecConfig) -> ApiResult<()>;

    /// Fetch the current state of a change control.
    async fn get_change_control(&self, id: &ChangeControlId) -> ApiResult<ChangeControl>;

    /// Approve a change control at a version.
    async fn set_approval(&self, config: ApproveConfig) -> ApiResult<()>;

    /// Flag a change control to start executing.
    async fn set_change_control_start(&self, config: StartConfig) -> ApiResult<()>;

    /// Subscribe to state snapshots of one change control.
    async fn subscribe_change_control(
        &self,
        id: &ChangeControlId,
    ) -> ApiResult<mpsc::Receiver<ChangeControl>>;

    /// List topology updates in a workspace with the given status.
    async fn get_topology_updates(
        &self,
        workspace_id: &WorkspaceId,
        status: UpdateStatus,
    ) -> ApiResult<Vec<TopologyUpdate>>;

    /// Set the acceptance status of a topology update.
    async fn set_topology_update(&self, config: TopologyUpdateConfig) -> ApiResult<()>;
}
