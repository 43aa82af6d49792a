use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InputsResult;

/// The `{path, inputs}` YAML envelope studio inputs are persisted in.
///
/// A fetched document is written with an empty path and the merged inputs;
/// on the way back, `inputs` is re-serialized to the JSON string the
/// platform expects and written at `path`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputsEnvelope {
    #[serde(default)]
    pub path: Vec<String>,
    pub inputs: Option<Value>,
}

impl InputsEnvelope {
    /// Envelope addressing the document root.
    pub fn at_root(inputs: Option<Value>) -> Self {
        Self { path: Vec::new(), inputs }
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> InputsResult<Self> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> InputsResult<()> {
        let file = File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }

    /// The JSON text sent verbatim to the platform; an unset document
    /// serializes as `null`.
    pub fn inputs_json(&self) -> InputsResult<String> {
        Ok(serde_json::to_string(self.inputs.as_ref().unwrap_or(&Value::Null))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("studio-inputs.yaml");
        let envelope = InputsEnvelope::at_root(Some(json!({
            "sites": [{"name": "NYC", "devices": [{"id": "dev1"}]}]
        })));
        envelope.to_yaml_file(&file).unwrap();
        let back = InputsEnvelope::from_yaml_file(&file).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn inputs_json_is_compact_json() {
        let envelope = InputsEnvelope::at_root(Some(json!({"a": [1, 2]})));
        assert_eq!(envelope.inputs_json().unwrap(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn unset_inputs_serialize_as_null() {
        let envelope = InputsEnvelope::at_root(None);
        assert_eq!(envelope.inputs_json().unwrap(), "null");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = InputsEnvelope::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, crate::InputsError::Io(_)));
    }

    #[test]
    fn envelope_with_non_root_path_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("partial.yaml");
        let envelope = InputsEnvelope {
            path: vec!["sites".into(), "0".into()],
            inputs: Some(json!({"name": "NYC"})),
        };
        envelope.to_yaml_file(&file).unwrap();
        assert_eq!(InputsEnvelope::from_yaml_file(&file).unwrap(), envelope);
    }
}
