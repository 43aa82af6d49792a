//! Per-device results of a workspace build.
//!
//! A build runs each assigned studio through input validation, configlet
//! compilation, and config validation for every affected device. The
//! detail records here carry enough context to point a user at the failing
//! field or template line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cvflow_types::{DeviceId, RequestId, StudioId, WorkspaceId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildState {
    #[default]
    Unspecified,
    InProgress,
    Success,
    Fail,
}

/// The pipeline stage a device build stopped in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildStage {
    #[default]
    Unspecified,
    InputValidation,
    ConfigletBuild,
    ConfigValidation,
}

/// Build results for one workspace build request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceBuild {
    pub workspace_id: WorkspaceId,
    pub build_id: RequestId,
    #[serde(default)]
    pub build_results: BTreeMap<DeviceId, DeviceBuildResult>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceBuildResult {
    pub state: BuildState,
    pub stage: BuildStage,
    #[serde(default)]
    pub input_validation_results: BTreeMap<StudioId, InputValidationResult>,
    #[serde(default)]
    pub configlet_build_results: BTreeMap<StudioId, ConfigletBuildResult>,
    #[serde(default)]
    pub configlet_validation_results: BTreeMap<StudioId, ConfigletValidationResult>,
}

/// A single input validation complaint, pointing at a field by path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputError {
    pub field_id: String,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputValidationResult {
    #[serde(default)]
    pub input_schema_errors: Vec<InputError>,
    #[serde(default)]
    pub input_value_errors: Vec<InputError>,
    #[serde(default)]
    pub other_errors: Vec<String>,
}

/// A template rendering failure during configlet compilation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateError {
    pub line_num: u32,
    pub exception: String,
    pub details: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigletBuildResult {
    #[serde(default)]
    pub template_errors: Vec<TemplateError>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigletError {
    pub error_code: String,
    pub configlet_name: String,
    pub line_num: u32,
    pub error_msg: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigletValidationResult {
    #[serde(default)]
    pub errors: Vec<ConfigletError>,
}
