use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use cvflow_api::{
    ActionExecConfig, ApproveConfig, AssignedTagsConfig, ChangeControlStatus, CvClient,
    InputsConfig, RequestResponse, ResponseStatus, StartConfig, TopologyUpdateConfig, UpdateStatus,
    WorkspaceConfig, WorkspaceRequest, WorkspaceState,
};
use cvflow_api::error::ApiError;
use cvflow_inputs::{AutofillAction, InputsEnvelope};
use cvflow_types::{ChangeControlId, DeviceId, RequestId, UpdateId, WorkspaceId};

use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::report::build_failure_report;

/// Document path the autofill action writes generated stack inputs at,
/// passed to the action as a JSON-encoded argument.
const STACK_INPUT_PATH: &str = r#"["sites", "0", "inputs", "sitesGroup", "devices", "0", "inputs", "devicesGroup", "stack"]"#;

/// Which pending topology updates to accept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateSelector {
    All,
    One(UpdateId),
}

/// Everything one push run needs.
#[derive(Clone, Debug, Default)]
pub struct PushRequest {
    pub display_name: String,
    /// Reuse an existing workspace instead of creating one.
    pub workspace: Option<WorkspaceId>,
    /// Inputs fragment to write before building.
    pub envelope: Option<InputsEnvelope>,
    /// Autofill actions to execute before building.
    pub actions: Vec<AutofillAction>,
    /// Devices the studio is assigned to; empty means all devices.
    pub devices: Vec<DeviceId>,
    /// Stop after a successful build, leaving the workspace pending.
    pub build_only: bool,
}

impl PushRequest {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), ..Self::default() }
    }
}

/// What a push run produced.
#[derive(Clone, Debug)]
pub struct PushOutcome {
    pub workspace_id: WorkspaceId,
    pub build_id: RequestId,
    /// Change controls executed by the run; empty for build-only runs.
    pub cc_ids: Vec<ChangeControlId>,
}

/// Drives the workspace pipeline against a [`CvClient`].
///
/// Every step is fail-fast: an error return means nothing after the
/// failing step was attempted, and the workspace is left as-is for
/// inspection.
pub struct Workflow<C> {
    client: C,
    config: WorkflowConfig,
}

impl<C: CvClient> Workflow<C> {
    pub fn new(client: C, config: WorkflowConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Create a fresh workspace with a random ID.
    pub async fn create_workspace(&self, display_name: &str) -> WorkflowResult<WorkspaceId> {
        let workspace_id = WorkspaceId::random();
        self.client
            .set_workspace_config(WorkspaceConfig::create(workspace_id.clone(), display_name))
            .await?;
        info!(workspace = %workspace_id, "workspace created");
        Ok(workspace_id)
    }

    /// Read the studio's mainline inputs, reassembling the paginated
    /// fragments into one document.
    ///
    /// Returns `None` when the studio has no inputs at all.
    pub async fn fetch_mainline_inputs(&self) -> WorkflowResult<Option<Value>> {
        let pages = self
            .client
            .get_all_inputs(&self.config.studio_id, &WorkspaceId::mainline())
            .await?;
        debug!(pages = pages.len(), "mainline inputs fetched");
        let mut document = None;
        for page in &pages {
            let fragment = page.fragment()?;
            document = Some(cvflow_merge::merge(document, &page.path, fragment));
        }
        Ok(document)
    }

    /// Write an inputs fragment into the workspace at the envelope's path.
    pub async fn set_inputs(
        &self,
        workspace_id: &WorkspaceId,
        envelope: &InputsEnvelope,
    ) -> WorkflowResult<()> {
        let config = InputsConfig {
            workspace_id: workspace_id.clone(),
            studio_id: self.config.studio_id.clone(),
            path: envelope.path.clone(),
            inputs: envelope.inputs_json()?,
        };
        self.client.set_inputs(config).await?;
        info!(workspace = %workspace_id, path = ?envelope.path, "inputs set");
        Ok(())
    }

    /// Assign the studio to the given devices, or all devices if none are
    /// given.
    pub async fn assign_devices(
        &self,
        workspace_id: &WorkspaceId,
        devices: &[DeviceId],
    ) -> WorkflowResult<()> {
        let config = AssignedTagsConfig::devices(
            workspace_id.clone(),
            self.config.studio_id.clone(),
            devices,
        );
        debug!(query = %config.query, "assigning studio");
        self.client.set_assigned_tags(config).await?;
        Ok(())
    }

    /// Generate inputs for one interface through the installed autofill
    /// action.
    pub async fn exec_autofill(
        &self,
        workspace_id: &WorkspaceId,
        action: &AutofillAction,
    ) -> WorkflowResult<()> {
        let action_id = self.config.action_id.clone().ok_or(WorkflowError::MissingActionId)?;
        let config = ActionExecConfig::new(action_id)
            .arg("InputPath", STACK_INPUT_PATH)
            .arg("StudioID", self.config.studio_id.as_str())
            .arg("WorkspaceID", workspace_id.as_str())
            .arg("device", action.device.as_str())
            .arg("interface", action.interface.as_str())
            .arg("profileID", action.profile_id.as_str())
            .arg("source", "generate");
        self.client.exec_action(config).await?;
        info!(
            device = %action.device,
            interface = %action.interface,
            profile = %action.profile_id,
            "inputs set from autofill action"
        );
        Ok(())
    }

    /// Start a build and wait for its response.
    ///
    /// A failed build is fetched and formatted into
    /// [`WorkflowError::BuildFailed`].
    pub async fn build(&self, workspace_id: &WorkspaceId) -> WorkflowResult<RequestId> {
        let build_id = RequestId::random();
        self.client
            .set_workspace_config(WorkspaceConfig::request(
                workspace_id.clone(),
                WorkspaceRequest::StartBuild,
                build_id.clone(),
            ))
            .await?;
        debug!(workspace = %workspace_id, build = %build_id, "build requested");
        let response = self
            .with_timeout(
                "build response",
                self.config.rpc_timeout,
                self.await_response(workspace_id, &build_id),
            )
            .await?;
        if response.status == ResponseStatus::Success {
            info!(workspace = %workspace_id, "build succeeded");
            return Ok(build_id);
        }
        let build = self.client.get_build(workspace_id, &build_id).await?;
        Err(WorkflowError::BuildFailed {
            report: build_failure_report(&build, &self.config.studio_id),
        })
    }

    /// Submit the workspace and wait until it reaches the submitted state,
    /// returning the change controls the submission spawned.
    pub async fn submit(&self, workspace_id: &WorkspaceId) -> WorkflowResult<Vec<ChangeControlId>> {
        let request_id = RequestId::random();
        self.client
            .set_workspace_config(WorkspaceConfig::request(
                workspace_id.clone(),
                WorkspaceRequest::Submit,
                request_id.clone(),
            ))
            .await?;
        debug!(workspace = %workspace_id, "submit requested");
        let wait = async {
            let mut rx = self.client.subscribe_workspace(workspace_id).await?;
            while let Some(ws) = rx.recv().await {
                if let Some(response) = ws.response(&request_id) {
                    if response.status != ResponseStatus::Success {
                        return Err(WorkflowError::SubmitFailed(response.message.clone()));
                    }
                }
                // The submitted state can land in a snapshot before the
                // response entry does; the state alone is terminal.
                if ws.state == WorkspaceState::Submitted {
                    return Ok(ws.cc_ids);
                }
            }
            Err(ApiError::Closed.into())
        };
        let cc_ids = self.with_timeout("submit response", self.config.rpc_timeout, wait).await?;
        info!(workspace = %workspace_id, change_controls = cc_ids.len(), "workspace submitted");
        Ok(cc_ids)
    }

    /// Approve, start, and wait out one change control.
    ///
    /// A completed change control that carries error text counts as a
    /// failed execution.
    pub async fn run_change_control(&self, id: &ChangeControlId) -> WorkflowResult<()> {
        let cc = self.client.get_change_control(id).await?;
        self.client
            .set_approval(ApproveConfig { id: id.clone(), approve: true, version: cc.version })
            .await?;
        self.client
            .set_change_control_start(StartConfig { id: id.clone(), start: true })
            .await?;
        debug!(change_control = %id, "change control started");
        let wait = async {
            let mut rx = self.client.subscribe_change_control(id).await?;
            while let Some(cc) = rx.recv().await {
                if cc.status != ChangeControlStatus::Completed {
                    continue;
                }
                if cc.failed() {
                    return Err(WorkflowError::ExecutionFailed {
                        id: id.clone(),
                        error: cc.error.unwrap_or_default(),
                    });
                }
                return Ok(());
            }
            Err(ApiError::Closed.into())
        };
        self.with_timeout("change control execution", self.config.cc_timeout, wait).await?;
        info!(change_control = %id, "change control completed");
        Ok(())
    }

    /// Accept pending topology updates into the workspace.
    ///
    /// Returns how many updates were accepted.
    pub async fn accept_topology_updates(
        &self,
        workspace_id: &WorkspaceId,
        selector: UpdateSelector,
    ) -> WorkflowResult<usize> {
        let update_ids = match selector {
            UpdateSelector::One(update_id) => vec![update_id],
            UpdateSelector::All => self
                .client
                .get_topology_updates(workspace_id, UpdateStatus::New)
                .await?
                .into_iter()
                .map(|u| u.update_id)
                .collect(),
        };
        for update_id in &update_ids {
            self.client
                .set_topology_update(TopologyUpdateConfig::accept(
                    workspace_id.clone(),
                    update_id.clone(),
                ))
                .await?;
            info!(update = %update_id, "topology update accepted");
        }
        Ok(update_ids.len())
    }

    /// Run the full pipeline: workspace, inputs, build, submit, and change
    /// control execution.
    pub async fn push(&self, request: PushRequest) -> WorkflowResult<PushOutcome> {
        let workspace_id = match request.workspace {
            Some(id) => id,
            None => self.create_workspace(&request.display_name).await?,
        };
        if let Some(envelope) = &request.envelope {
            self.set_inputs(&workspace_id, envelope).await?;
            self.assign_devices(&workspace_id, &request.devices).await?;
        }
        for action in &request.actions {
            self.exec_autofill(&workspace_id, action).await?;
        }
        let build_id = self.build(&workspace_id).await?;
        if request.build_only {
            info!(workspace = %workspace_id, "build-only run, leaving workspace pending");
            return Ok(PushOutcome { workspace_id, build_id, cc_ids: Vec::new() });
        }
        let cc_ids = self.submit(&workspace_id).await?;
        for id in &cc_ids {
            self.run_change_control(id).await?;
        }
        Ok(PushOutcome { workspace_id, build_id, cc_ids })
    }

    async fn await_response(
        &self,
        workspace_id: &WorkspaceId,
        request_id: &RequestId,
    ) -> WorkflowResult<RequestResponse> {
        let mut rx = self.client.subscribe_workspace(workspace_id).await?;
        while let Some(ws) = rx.recv().await {
            if let Some(response) = ws.response(request_id) {
                return Ok(response.clone());
            }
        }
        Err(ApiError::Closed.into())
    }

    async fn with_timeout<T>(
        &self,
        stage: &'static str,
        deadline: Duration,
        fut: impl Future<Output = WorkflowResult<T>>,
    ) -> WorkflowResult<T> {
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(WorkflowError::Timeout { stage }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use serde_json::json;

    use cvflow_api::{
        BuildStage, BuildState, DeviceBuildResult, InMemoryCv, InputError, InputsPage,
        InputValidationResult, TopologyUpdate, Workspace,
    };
    use cvflow_types::{ActionId, StudioId};

    fn workflow(cv: InMemoryCv) -> Workflow<InMemoryCv> {
        Workflow::new(cv, WorkflowConfig::new(StudioId::new("studio-evpn")))
    }

    #[tokio::test]
    async fn push_runs_the_full_pipeline() {
        let wf = workflow(InMemoryCv::new());
        let mut request = PushRequest::new("push sites");
        request.envelope = Some(InputsEnvelope {
            path: vec!["sites".into(), "0".into()],
            inputs: Some(json!({"name": "NYC"})),
        });
        request.devices = vec![DeviceId::new("dev1")];
        let outcome = wf.push(request).await.unwrap();

        let inputs = wf.client().inputs_log();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].path, vec!["sites".to_string(), "0".to_string()]);
        assert_eq!(inputs[0].inputs, r#"{"name":"NYC"}"#);
        assert_eq!(wf.client().tags_log()[0].query, "device:dev1");
        assert_eq!(outcome.cc_ids.len(), 1);
        let cc = wf.client().change_control(&outcome.cc_ids[0]).unwrap();
        assert_eq!(cc.status, ChangeControlStatus::Completed);
        assert!(!cc.failed());
        assert_eq!(wf.client().approvals_log().len(), 1);
    }

    #[tokio::test]
    async fn build_only_leaves_workspace_pending() {
        let wf = workflow(InMemoryCv::new());
        let mut request = PushRequest::new("dry run");
        request.envelope = Some(InputsEnvelope::at_root(Some(json!({"a": 1}))));
        request.build_only = true;
        let outcome = wf.push(request).await.unwrap();
        assert!(outcome.cc_ids.is_empty());
        let ws = wf.client().workspace(&outcome.workspace_id).unwrap();
        assert_eq!(ws.state, WorkspaceState::Pending);
    }

    #[tokio::test]
    async fn failed_build_halts_with_a_report() {
        let cv = InMemoryCv::new();
        let ivr = InputValidationResult {
            input_value_errors: vec![InputError {
                field_id: "vlan".into(),
                path: vec!["sites".into()],
                members: vec![],
                message: "out of range".into(),
            }],
            ..InputValidationResult::default()
        };
        cv.fail_next_build(BTreeMap::from([(
            DeviceId::new("dev1"),
            DeviceBuildResult {
                state: BuildState::Fail,
                stage: BuildStage::InputValidation,
                input_validation_results: BTreeMap::from([(StudioId::new("studio-evpn"), ivr)]),
                ..DeviceBuildResult::default()
            },
        )]));
        let wf = workflow(cv);
        let err = wf.push(PushRequest::new("bad push")).await.unwrap_err();
        let WorkflowError::BuildFailed { report } = err else {
            panic!("expected build failure, got {err}");
        };
        assert!(report.contains("Device dev1:"));
        assert!(report.contains("Field ID: vlan"));
        // Halted before submitting.
        assert!(wf.client().approvals_log().is_empty());
    }

    #[tokio::test]
    async fn failed_submit_halts_before_change_controls() {
        let cv = InMemoryCv::new();
        cv.fail_next_submit("mainline moved");
        let wf = workflow(cv);
        let err = wf.push(PushRequest::new("stale push")).await.unwrap_err();
        assert!(matches!(err, WorkflowError::SubmitFailed(msg) if msg == "mainline moved"));
        assert!(wf.client().approvals_log().is_empty());
    }

    #[tokio::test]
    async fn submit_succeeds_on_submitted_state_without_a_response_entry() {
        let cv = InMemoryCv::new();
        let ws_id = WorkspaceId::new("ws-1");
        // Neither snapshot carries the response entry for the submit
        // request; the state flip alone must conclude the wait.
        let pending = Workspace {
            workspace_id: ws_id.clone(),
            state: WorkspaceState::Pending,
            ..Workspace::default()
        };
        let submitted = Workspace {
            workspace_id: ws_id.clone(),
            state: WorkspaceState::Submitted,
            cc_ids: vec![ChangeControlId::new("cc-9")],
            ..Workspace::default()
        };
        cv.stage_workspace_snapshots(vec![pending, submitted]);
        let wf = workflow(cv);
        let cc_ids = wf.submit(&ws_id).await.unwrap();
        assert_eq!(cc_ids, vec![ChangeControlId::new("cc-9")]);
    }

    #[tokio::test]
    async fn change_control_error_text_fails_the_run() {
        let cv = InMemoryCv::new();
        cv.fail_change_controls("device unreachable");
        let wf = workflow(cv);
        let err = wf.push(PushRequest::new("push")).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::ExecutionFailed { error, .. } if error == "device unreachable"
        ));
    }

    #[tokio::test]
    async fn each_spawned_change_control_is_executed() {
        let cv = InMemoryCv::new();
        cv.set_ccs_per_submit(3);
        let wf = workflow(cv);
        let outcome = wf.push(PushRequest::new("push")).await.unwrap();
        assert_eq!(outcome.cc_ids.len(), 3);
        assert_eq!(wf.client().approvals_log().len(), 3);
        for id in &outcome.cc_ids {
            let cc = wf.client().change_control(id).unwrap();
            assert_eq!(cc.status, ChangeControlStatus::Completed);
        }
    }

    #[tokio::test]
    async fn silent_platform_times_out() {
        let cv = InMemoryCv::new();
        cv.hang_subscriptions();
        let mut config = WorkflowConfig::new(StudioId::new("studio-evpn"));
        config.rpc_timeout = Duration::from_millis(20);
        let wf = Workflow::new(cv, config);
        let err = wf.push(PushRequest::new("push")).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Timeout { stage: "build response" }));
    }

    #[tokio::test]
    async fn mainline_pages_fold_in_delivery_order() {
        let cv = InMemoryCv::new();
        cv.seed_mainline_inputs(vec![
            InputsPage::new(vec![], r#"{"sites": []}"#),
            InputsPage::new(vec!["sites".into(), "0".into()], r#"{"name": "NYC"}"#),
            InputsPage::new(
                vec!["sites".into(), "0".into(), "devices".into()],
                r#"["dev1"]"#,
            ),
        ]);
        let wf = workflow(cv);
        let doc = wf.fetch_mainline_inputs().await.unwrap().unwrap();
        assert_eq!(doc, json!({"sites": [{"name": "NYC", "devices": ["dev1"]}]}));
    }

    #[tokio::test]
    async fn empty_mainline_yields_no_document() {
        let wf = workflow(InMemoryCv::new());
        assert!(wf.fetch_mainline_inputs().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn autofill_carries_the_action_arguments() {
        let cv = InMemoryCv::new();
        let config = WorkflowConfig::new(StudioId::new("studio-evpn"))
            .with_action(ActionId::new("action-autofill"));
        let wf = Workflow::new(cv, config);
        let ws_id = wf.create_workspace("autofill").await.unwrap();
        let action = AutofillAction {
            device: "dev1".into(),
            interface: "Ethernet1".into(),
            profile_id: "profile-a".into(),
        };
        wf.exec_autofill(&ws_id, &action).await.unwrap();
        let log = wf.client().actions_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].args["device"], "dev1");
        assert_eq!(log[0].args["interface"], "Ethernet1");
        assert_eq!(log[0].args["profileID"], "profile-a");
        assert_eq!(log[0].args["source"], "generate");
        assert_eq!(log[0].args["WorkspaceID"], ws_id.as_str());
        assert!(log[0].args["InputPath"].contains("devicesGroup"));
    }

    #[tokio::test]
    async fn autofill_without_action_id_is_rejected() {
        let wf = workflow(InMemoryCv::new());
        let ws_id = wf.create_workspace("autofill").await.unwrap();
        let action = AutofillAction {
            device: "dev1".into(),
            interface: "Ethernet1".into(),
            profile_id: "p".into(),
        };
        let err = wf.exec_autofill(&ws_id, &action).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MissingActionId));
    }

    #[tokio::test]
    async fn accept_all_topology_updates() {
        let cv = InMemoryCv::new();
        let wf = workflow(cv);
        let ws_id = wf.create_workspace("onboard").await.unwrap();
        wf.client().seed_topology_updates(vec![
            TopologyUpdate {
                workspace_id: ws_id.clone(),
                update_id: UpdateId::new("u-1"),
                status: UpdateStatus::New,
            },
            TopologyUpdate {
                workspace_id: ws_id.clone(),
                update_id: UpdateId::new("u-2"),
                status: UpdateStatus::New,
            },
        ]);
        let accepted =
            wf.accept_topology_updates(&ws_id, UpdateSelector::All).await.unwrap();
        assert_eq!(accepted, 2);
        assert!(wf
            .client()
            .topology_updates()
            .iter()
            .all(|u| u.status == UpdateStatus::Accepted));
    }

    #[tokio::test]
    async fn accept_one_topology_update() {
        let cv = InMemoryCv::new();
        let wf = workflow(cv);
        let ws_id = wf.create_workspace("onboard").await.unwrap();
        wf.client().seed_topology_updates(vec![TopologyUpdate {
            workspace_id: ws_id.clone(),
            update_id: UpdateId::new("u-1"),
            status: UpdateStatus::New,
        }]);
        let accepted = wf
            .accept_topology_updates(&ws_id, UpdateSelector::One(UpdateId::new("u-1")))
            .await
            .unwrap();
        assert_eq!(accepted, 1);
        assert_eq!(wf.client().topology_updates()[0].status, UpdateStatus::Accepted);
    }
}
