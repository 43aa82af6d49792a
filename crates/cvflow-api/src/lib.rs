//! Platform resource models and client seam for cvflow.
//!
//! The configuration platform exposes its state as resources: workspaces
//! staging pending changes, studio inputs addressed by document paths,
//! build results, and change controls spawned by submissions. This crate
//! models those resources and defines [`CvClient`], the seam every
//! workflow operation goes through.
//!
//! Two implementations ship here: [`HttpClient`], a JSON-over-HTTP client
//! for a live platform, and [`InMemoryCv`], a scriptable in-process
//! simulation used by workflow tests.

pub mod action;
pub mod build;
pub mod changecontrol;
pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod studio;
pub mod tag;
pub mod topology;
pub mod workspace;

pub use action::ActionExecConfig;
pub use build::{
    BuildStage, BuildState, ConfigletBuildResult, ConfigletError, ConfigletValidationResult,
    DeviceBuildResult, InputError, InputValidationResult, TemplateError, WorkspaceBuild,
};
pub use changecontrol::{ApproveConfig, ChangeControl, ChangeControlStatus, StartConfig};
pub use client::CvClient;
pub use error::{ApiError, ApiResult};
pub use http::{ConnectionConfig, HttpClient};
pub use memory::InMemoryCv;
pub use studio::{AssignedTagsConfig, InputsConfig, InputsPage};
pub use tag::DeviceTag;
pub use topology::{TopologyUpdate, TopologyUpdateConfig, UpdateStatus};
pub use workspace::{
    RequestResponse, ResponseStatus, Workspace, WorkspaceConfig, WorkspaceRequest, WorkspaceState,
};
