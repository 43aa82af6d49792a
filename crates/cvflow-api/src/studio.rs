use serde::{Deserialize, Serialize};
use serde_json::Value;

use cvflow_types::{DeviceId, StudioId, WorkspaceId};

/// One record of the paginated studio inputs stream.
///
/// `inputs` is a JSON-encoded fragment belonging at `path` within the
/// studio's inputs document. Records must be applied in delivery order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputsPage {
    #[serde(default)]
    pub path: Vec<String>,
    pub inputs: String,
}

impl InputsPage {
    pub fn new(path: Vec<String>, inputs: impl Into<String>) -> Self {
        Self { path, inputs: inputs.into() }
    }

    /// Decode the JSON fragment carried by this page.
    pub fn fragment(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.inputs)
    }
}

/// Writes a JSON-encoded inputs fragment at a path within a workspace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputsConfig {
    pub workspace_id: WorkspaceId,
    pub studio_id: StudioId,
    #[serde(default)]
    pub path: Vec<String>,
    pub inputs: String,
}

/// Assigns a studio to the devices matched by a tag query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignedTagsConfig {
    pub workspace_id: WorkspaceId,
    pub studio_id: StudioId,
    pub query: String,
}

impl AssignedTagsConfig {
    /// Assign to an explicit set of devices, or all devices if the set is
    /// empty.
    pub fn devices(workspace_id: WorkspaceId, studio_id: StudioId, devices: &[DeviceId]) -> Self {
        let query = if devices.is_empty() {
            "device:*".to_string()
        } else {
            let ids: Vec<&str> = devices.iter().map(|d| d.as_str()).collect();
            format!("device:{}", ids.join(","))
        };
        Self { workspace_id, studio_id, query }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_fragment_decodes_json() {
        let page = InputsPage::new(vec!["sites".into(), "0".into()], r#"{"name":"NYC"}"#);
        assert_eq!(page.fragment().unwrap(), json!({"name": "NYC"}));
    }

    #[test]
    fn page_fragment_rejects_bad_json() {
        let page = InputsPage::new(vec![], "{nope");
        assert!(page.fragment().is_err());
    }

    #[test]
    fn device_query_joins_ids() {
        let cfg = AssignedTagsConfig::devices(
            WorkspaceId::new("ws-1"),
            StudioId::new("st-1"),
            &[DeviceId::new("a"), DeviceId::new("b")],
        );
        assert_eq!(cfg.query, "device:a,b");
    }

    #[test]
    fn empty_device_set_matches_all() {
        let cfg =
            AssignedTagsConfig::devices(WorkspaceId::new("ws-1"), StudioId::new("st-1"), &[]);
        assert_eq!(cfg.query, "device:*");
    }
}
