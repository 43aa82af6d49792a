//! In-memory platform simulation.
//!
//! Intended for tests and embedding. The simulation answers build and
//! submit requests synchronously at Set time, spawns change controls on
//! submission, and serves scripted mainline inputs pages. Failure paths
//! are injected through the scripting methods; every Set call is logged so
//! tests can assert what reached the platform.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use cvflow_types::{ChangeControlId, DeviceId, RequestId, StudioId, WorkspaceId};

use crate::action::ActionExecConfig;
use crate::build::{DeviceBuildResult, WorkspaceBuild};
use crate::changecontrol::{ApproveConfig, ChangeControl, ChangeControlStatus, StartConfig};
use crate::client::CvClient;
use crate::error::{ApiError, ApiResult};
use crate::studio::{AssignedTagsConfig, InputsConfig, InputsPage};
use crate::tag::DeviceTag;
use crate::topology::{TopologyUpdate, TopologyUpdateConfig, UpdateStatus};
use crate::workspace::{
    RequestResponse, ResponseStatus, Workspace, WorkspaceConfig, WorkspaceRequest, WorkspaceState,
};

struct State {
    workspaces: BTreeMap<WorkspaceId, Workspace>,
    builds: BTreeMap<(WorkspaceId, RequestId), WorkspaceBuild>,
    change_controls: BTreeMap<ChangeControlId, ChangeControl>,
    topology_updates: Vec<TopologyUpdate>,
    device_tags: Vec<DeviceTag>,
    mainline_pages: Vec<InputsPage>,
    staged_ws: Vec<Workspace>,
    inputs_log: Vec<InputsConfig>,
    tags_log: Vec<AssignedTagsConfig>,
    actions_log: Vec<ActionExecConfig>,
    approvals_log: Vec<ApproveConfig>,
    next_build_failure: Option<BTreeMap<DeviceId, DeviceBuildResult>>,
    next_submit_failure: Option<String>,
    cc_error: Option<String>,
    ccs_per_submit: usize,
    hang_subscriptions: bool,
    parked_ws: Vec<mpsc::Sender<Workspace>>,
    parked_cc: Vec<mpsc::Sender<ChangeControl>>,
    cc_seq: usize,
}

impl Default for State {
    fn default() -> Self {
        Self {
            workspaces: BTreeMap::new(),
            builds: BTreeMap::new(),
            change_controls: BTreeMap::new(),
            topology_updates: Vec::new(),
            device_tags: Vec::new(),
            mainline_pages: Vec::new(),
            staged_ws: Vec::new(),
            inputs_log: Vec::new(),
            tags_log: Vec::new(),
            actions_log: Vec::new(),
            approvals_log: Vec::new(),
            next_build_failure: None,
            next_submit_failure: None,
            cc_error: None,
            ccs_per_submit: 1,
            hang_subscriptions: false,
            parked_ws: Vec::new(),
            parked_cc: Vec::new(),
            cc_seq: 0,
        }
    }
}

/// In-memory [`CvClient`] implementation.
#[derive(Default)]
pub struct InMemoryCv {
    state: Mutex<State>,
}

impl InMemoryCv {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Scripting ----

    /// Script the pages returned for mainline inputs reads.
    pub fn seed_mainline_inputs(&self, pages: Vec<InputsPage>) {
        self.state.lock().expect("lock poisoned").mainline_pages = pages;
    }

    /// Script pending topology updates.
    pub fn seed_topology_updates(&self, updates: Vec<TopologyUpdate>) {
        self.state.lock().expect("lock poisoned").topology_updates = updates;
    }

    /// Script the device tag assignments served by tag reads.
    pub fn seed_device_tags(&self, tags: Vec<DeviceTag>) {
        self.state.lock().expect("lock poisoned").device_tags = tags;
    }

    /// Script the exact snapshot sequence delivered by the next workspace
    /// subscription, overriding the live workspace state.
    pub fn stage_workspace_snapshots(&self, snapshots: Vec<Workspace>) {
        self.state.lock().expect("lock poisoned").staged_ws = snapshots;
    }

    /// Make the next build request fail with the given per-device results.
    pub fn fail_next_build(&self, results: BTreeMap<DeviceId, DeviceBuildResult>) {
        self.state.lock().expect("lock poisoned").next_build_failure = Some(results);
    }

    /// Make the next submit request fail with a message.
    pub fn fail_next_submit(&self, message: impl Into<String>) {
        self.state.lock().expect("lock poisoned").next_submit_failure = Some(message.into());
    }

    /// Make executed change controls complete with an error.
    pub fn fail_change_controls(&self, error: impl Into<String>) {
        self.state.lock().expect("lock poisoned").cc_error = Some(error.into());
    }

    /// Number of change controls spawned per submission (default 1).
    pub fn set_ccs_per_submit(&self, n: usize) {
        self.state.lock().expect("lock poisoned").ccs_per_submit = n;
    }

    /// Make subscriptions deliver nothing and never close, so caller
    /// timeouts fire.
    pub fn hang_subscriptions(&self) {
        self.state.lock().expect("lock poisoned").hang_subscriptions = true;
    }

    // ---- Inspection ----

    pub fn workspace(&self, id: &WorkspaceId) -> Option<Workspace> {
        self.state.lock().expect("lock poisoned").workspaces.get(id).cloned()
    }

    pub fn change_control(&self, id: &ChangeControlId) -> Option<ChangeControl> {
        self.state.lock().expect("lock poisoned").change_controls.get(id).cloned()
    }

    pub fn inputs_log(&self) -> Vec<InputsConfig> {
        self.state.lock().expect("lock poisoned").inputs_log.clone()
    }

    pub fn tags_log(&self) -> Vec<AssignedTagsConfig> {
        self.state.lock().expect("lock poisoned").tags_log.clone()
    }

    pub fn actions_log(&self) -> Vec<ActionExecConfig> {
        self.state.lock().expect("lock poisoned").actions_log.clone()
    }

    pub fn approvals_log(&self) -> Vec<ApproveConfig> {
        self.state.lock().expect("lock poisoned").approvals_log.clone()
    }

    pub fn topology_updates(&self) -> Vec<TopologyUpdate> {
        self.state.lock().expect("lock poisoned").topology_updates.clone()
    }
}

fn success() -> RequestResponse {
    RequestResponse { status: ResponseStatus::Success, message: String::new() }
}

fn failure(message: impl Into<String>) -> RequestResponse {
    RequestResponse { status: ResponseStatus::Fail, message: message.into() }
}

#[async_trait]
impl CvClient for InMemoryCv {
    async fn set_workspace_config(&self, config: WorkspaceConfig) -> ApiResult<()> {
        let mut guard = self.state.lock().expect("lock poisoned");
        let state = &mut *guard;
        let workspace_id = config.workspace_id.clone();
        let ws = state
            .workspaces
            .entry(workspace_id.clone())
            .or_insert_with(|| Workspace { workspace_id, ..Workspace::default() });
        let Some(request) = config.request else {
            return Ok(());
        };
        let Some(request_id) = config.request_id else {
            return Err(ApiError::Status {
                code: 400,
                message: "request without request id".into(),
            });
        };
        match request {
            WorkspaceRequest::StartBuild => {
                if let Some(results) = state.next_build_failure.take() {
                    ws.responses.insert(request_id.clone(), failure("build failed"));
                    state.builds.insert(
                        (ws.workspace_id.clone(), request_id.clone()),
                        WorkspaceBuild {
                            workspace_id: ws.workspace_id.clone(),
                            build_id: request_id,
                            build_results: results,
                        },
                    );
                } else {
                    ws.responses.insert(request_id, success());
                }
            }
            WorkspaceRequest::Submit => {
                if let Some(message) = state.next_submit_failure.take() {
                    ws.responses.insert(request_id, failure(message));
                } else {
                    ws.responses.insert(request_id, success());
                    ws.state = WorkspaceState::Submitted;
                    let mut spawned = Vec::with_capacity(state.ccs_per_submit);
                    for _ in 0..state.ccs_per_submit {
                        state.cc_seq += 1;
                        spawned.push(ChangeControlId::new(format!("cc-{}", state.cc_seq)));
                    }
                    for id in &spawned {
                        state.change_controls.insert(
                            id.clone(),
                            ChangeControl {
                                id: id.clone(),
                                status: ChangeControlStatus::Scheduled,
                                error: None,
                                version: Utc::now(),
                            },
                        );
                    }
                    ws.cc_ids = spawned;
                }
            }
        }
        Ok(())
    }

    async fn subscribe_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> ApiResult<mpsc::Receiver<Workspace>> {
        let mut state = self.state.lock().expect("lock poisoned");
        let (tx, rx) = mpsc::channel(8);
        if state.hang_subscriptions {
            state.parked_ws.push(tx);
            return Ok(rx);
        }
        if !state.staged_ws.is_empty() {
            for snapshot in state.staged_ws.drain(..) {
                let _ = tx.try_send(snapshot);
            }
            return Ok(rx);
        }
        let snapshot = state.workspaces.get(workspace_id).cloned().unwrap_or_else(|| {
            Workspace { workspace_id: workspace_id.clone(), ..Workspace::default() }
        });
        let _ = tx.try_send(snapshot);
        Ok(rx)
    }

    async fn get_build(
        &self,
        workspace_id: &WorkspaceId,
        build_id: &RequestId,
    ) -> ApiResult<WorkspaceBuild> {
        let state = self.state.lock().expect("lock poisoned");
        state
            .builds
            .get(&(workspace_id.clone(), build_id.clone()))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("build {build_id} in {workspace_id}")))
    }

    async fn get_all_inputs(
        &self,
        _studio_id: &StudioId,
        _workspace_id: &WorkspaceId,
    ) -> ApiResult<Vec<InputsPage>> {
        Ok(self.state.lock().expect("lock poisoned").mainline_pages.clone())
    }

    async fn set_inputs(&self, config: InputsConfig) -> ApiResult<()> {
        self.state.lock().expect("lock poisoned").inputs_log.push(config);
        Ok(())
    }

    async fn set_assigned_tags(&self, config: AssignedTagsConfig) -> ApiResult<()> {
        self.state.lock().expect("lock poisoned").tags_log.push(config);
        Ok(())
    }

    async fn get_device_tags(
        &self,
        _workspace_id: &WorkspaceId,
        label: &str,
    ) -> ApiResult<Vec<DeviceTag>> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state
            .device_tags
            .iter()
            .filter(|t| t.label == label)
            .cloned()
            .collect())
    }

    async fn exec_action(&self, config: ActionExecConfig) -> ApiResult<()> {
        self.state.lock().expect("lock poisoned").actions_log.push(config);
        Ok(())
    }

    async fn get_change_control(&self, id: &ChangeControlId) -> ApiResult<ChangeControl> {
        let state = self.state.lock().expect("lock poisoned");
        state
            .change_controls
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn set_approval(&self, config: ApproveConfig) -> ApiResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        if !state.change_controls.contains_key(&config.id) {
            return Err(ApiError::NotFound(config.id.to_string()));
        }
        state.approvals_log.push(config);
        Ok(())
    }

    async fn set_change_control_start(&self, config: StartConfig) -> ApiResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        let error = state.cc_error.clone();
        let cc = state
            .change_controls
            .get_mut(&config.id)
            .ok_or_else(|| ApiError::NotFound(config.id.to_string()))?;
        if config.start {
            cc.status = ChangeControlStatus::Completed;
            cc.error = error;
        }
        Ok(())
    }

    async fn subscribe_change_control(
        &self,
        id: &ChangeControlId,
    ) -> ApiResult<mpsc::Receiver<ChangeControl>> {
        let mut state = self.state.lock().expect("lock poisoned");
        let (tx, rx) = mpsc::channel(4);
        if state.hang_subscriptions {
            state.parked_cc.push(tx);
            return Ok(rx);
        }
        let snapshot = state
            .change_controls
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        let _ = tx.try_send(snapshot);
        Ok(rx)
    }

    async fn get_topology_updates(
        &self,
        workspace_id: &WorkspaceId,
        status: UpdateStatus,
    ) -> ApiResult<Vec<TopologyUpdate>> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state
            .topology_updates
            .iter()
            .filter(|u| u.workspace_id == *workspace_id && u.status == status)
            .cloned()
            .collect())
    }

    async fn set_topology_update(&self, config: TopologyUpdateConfig) -> ApiResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        let update = state
            .topology_updates
            .iter_mut()
            .find(|u| u.workspace_id == config.workspace_id && u.update_id == config.update_id)
            .ok_or_else(|| ApiError::NotFound(config.update_id.to_string()))?;
        update.status = config.status;
        Ok(())
    }
}
