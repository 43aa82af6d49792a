//! JSON-over-HTTP client for a live platform.
//!
//! Resource writes POST the config body and resource reads GET with query
//! parameters. Subscriptions are poll loops: a background task fetches the
//! resource snapshot at an interval and feeds it into a channel until the
//! subscriber drops the receiver.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use cvflow_types::{ChangeControlId, RequestId, StudioId, WorkspaceId};

use crate::action::ActionExecConfig;
use crate::build::WorkspaceBuild;
use crate::changecontrol::{ApproveConfig, ChangeControl, StartConfig};
use crate::client::CvClient;
use crate::error::{ApiError, ApiResult};
use crate::studio::{AssignedTagsConfig, InputsConfig, InputsPage};
use crate::tag::DeviceTag;
use crate::topology::{TopologyUpdate, TopologyUpdateConfig, UpdateStatus};
use crate::workspace::{Workspace, WorkspaceConfig};

/// Connection parameters for a platform endpoint.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Server endpoint, `host[:port]` or a full `http(s)://` URL.
    pub server: String,
    /// Service-account access token sent as a bearer credential.
    pub token: String,
    /// PEM-encoded root CA for self-signed deployments.
    pub ca_cert: Option<Vec<u8>>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(server: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token: token.into(),
            ca_cert: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`CvClient`] implementation over HTTP/JSON.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: String,
    poll_interval: Duration,
}

impl HttpClient {
    pub fn connect(config: ConnectionConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers);
        if let Some(pem) = &config.ca_cert {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder.build().map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base: base_url(&config.server),
            poll_interval: Duration::from_millis(500),
        })
    }

    /// Override the subscription poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn post<B: Serialize>(&self, resource: &str, body: &B) -> ApiResult<()> {
        let url = format!("{}/{}", self.base, resource);
        debug!(%url, "post");
        let resp = self.http.post(&url).json(body).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn get<T, Q>(&self, resource: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base, resource);
        debug!(%url, "get");
        let resp = self.http.get(&url).query(query).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Spawn a poll loop feeding resource snapshots into a channel.
    fn poll_into<T, F, Fut>(&self, fetch: F) -> mpsc::Receiver<T>
    where
        T: Send + 'static,
        F: Fn(HttpClient) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ApiResult<T>> + Send,
    {
        let (tx, rx) = mpsc::channel(16);
        let client = self.clone();
        let interval = self.poll_interval;
        tokio::spawn(async move {
            loop {
                match fetch(client.clone()).await {
                    Ok(snapshot) => {
                        if tx.send(snapshot).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "poll fetch failed, closing subscription");
                        break;
                    }
                }
                tokio::time::sleep(interval).await;
            }
        });
        rx
    }
}

fn base_url(server: &str) -> String {
    let root = if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", server.trim_end_matches('/'))
    };
    format!("{root}/api/resources")
}

async fn check_status(resp: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(message));
    }
    Err(ApiError::Status { code: status.as_u16(), message })
}

#[async_trait]
impl CvClient for HttpClient {
    async fn set_workspace_config(&self, config: WorkspaceConfig) -> ApiResult<()> {
        self.post("workspace.v1/WorkspaceConfig", &config).await
    }

    async fn subscribe_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> ApiResult<mpsc::Receiver<Workspace>> {
        let id = workspace_id.clone();
        Ok(self.poll_into(move |client| {
            let id = id.clone();
            async move {
                client
                    .get("workspace.v1/Workspace", &[("workspaceId", id.as_str())])
                    .await
            }
        }))
    }

    async fn get_build(
        &self,
        workspace_id: &WorkspaceId,
        build_id: &RequestId,
    ) -> ApiResult<WorkspaceBuild> {
        self.get(
            "workspace.v1/WorkspaceBuild",
            &[
                ("workspaceId", workspace_id.as_str()),
                ("buildId", build_id.as_str()),
            ],
        )
        .await
    }

    async fn get_all_inputs(
        &self,
        studio_id: &StudioId,
        workspace_id: &WorkspaceId,
    ) -> ApiResult<Vec<InputsPage>> {
        self.get(
            "studio.v1/Inputs/all",
            &[
                ("studioId", studio_id.as_str()),
                ("workspaceId", workspace_id.as_str()),
            ],
        )
        .await
    }

    async fn set_inputs(&self, config: InputsConfig) -> ApiResult<()> {
        self.post("studio.v1/InputsConfig", &config).await
    }

    async fn set_assigned_tags(&self, config: AssignedTagsConfig) -> ApiResult<()> {
        self.post("studio.v1/AssignedTagsConfig", &config).await
    }

    async fn get_device_tags(
        &self,
        workspace_id: &WorkspaceId,
        label: &str,
    ) -> ApiResult<Vec<DeviceTag>> {
        self.get(
            "tag.v2/TagAssignment/all",
            &[
                ("workspaceId", workspace_id.as_str()),
                ("elementType", "ELEMENT_TYPE_DEVICE"),
                ("label", label),
            ],
        )
        .await
    }

    async fn exec_action(&self, config: ActionExecConfig) -> ApiResult<()> {
        self.post("action.v1/ActionExecConfig", &config).await
    }

    async fn get_change_control(&self, id: &ChangeControlId) -> ApiResult<ChangeControl> {
        self.get("changecontrol.v1/ChangeControl", &[("id", id.as_str())])
            .await
    }

    async fn set_approval(&self, config: ApproveConfig) -> ApiResult<()> {
        self.post("changecontrol.v1/ApproveConfig", &config).await
    }

    async fn set_change_control_start(&self, config: StartConfig) -> ApiResult<()> {
        self.post("changecontrol.v1/ChangeControlConfig", &config).await
    }

    async fn subscribe_change_control(
        &self,
        id: &ChangeControlId,
    ) -> ApiResult<mpsc::Receiver<ChangeControl>> {
        let id = id.clone();
        Ok(self.poll_into(move |client| {
            let id = id.clone();
            async move { client.get_change_control(&id).await }
        }))
    }

    async fn get_topology_updates(
        &self,
        workspace_id: &WorkspaceId,
        status: UpdateStatus,
    ) -> ApiResult<Vec<TopologyUpdate>> {
        let status = match status {
            UpdateStatus::Unspecified => "",
            UpdateStatus::New => "New",
            UpdateStatus::Accepted => "Accepted",
        };
        self.get(
            "studio_topology.v1/Update/all",
            &[
                ("workspaceId", workspace_id.as_str()),
                ("status", status),
            ],
        )
        .await
    }

    async fn set_topology_update(&self, config: TopologyUpdateConfig) -> ApiResult<()> {
        self.post("studio_topology.v1/UpdateConfig", &config).await
    }
}
