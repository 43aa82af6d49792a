use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cvflow_types::{ChangeControlId, RequestId, WorkspaceId};

/// An asynchronous operation requested on a workspace.
///
/// The platform answers a request by publishing a [`RequestResponse`] under
/// the request's ID on the workspace resource, once the operation reaches a
/// terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkspaceRequest {
    StartBuild,
    Submit,
}

/// Writable configuration of a workspace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub workspace_id: WorkspaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<WorkspaceRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl WorkspaceConfig {
    /// Config that creates a workspace with a display name.
    pub fn create(workspace_id: WorkspaceId, display_name: impl Into<String>) -> Self {
        Self {
            workspace_id,
            display_name: Some(display_name.into()),
            request: None,
            request_id: None,
        }
    }

    /// Config that requests an operation, correlated by `request_id`.
    pub fn request(
        workspace_id: WorkspaceId,
        request: WorkspaceRequest,
        request_id: RequestId,
    ) -> Self {
        Self {
            workspace_id,
            display_name: None,
            request: Some(request),
            request_id: Some(request_id),
        }
    }
}

/// Terminal status of an answered workspace request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[default]
    Unspecified,
    Success,
    Fail,
}

/// The platform's answer to a workspace request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkspaceState {
    #[default]
    Pending,
    Submitted,
    Abandoned,
    RolledBack,
    Conflicts,
}

/// Read-only state of a workspace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_id: WorkspaceId,
    pub state: WorkspaceState,
    /// Answers to requests, keyed by request ID.
    #[serde(default)]
    pub responses: BTreeMap<RequestId, RequestResponse>,
    /// Change controls spawned by submission; populated once `state`
    /// reaches [`WorkspaceState::Submitted`].
    #[serde(default)]
    pub cc_ids: Vec<ChangeControlId>,
}

impl Workspace {
    /// The answer to a specific request, if the platform published one.
    pub fn response(&self, request_id: &RequestId) -> Option<&RequestResponse> {
        self.responses.get(request_id)
    }
}
