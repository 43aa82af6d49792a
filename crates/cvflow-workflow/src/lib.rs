//! Workspace orchestration.
//!
//! Drives a studio change from workspace creation through inputs, build,
//! submit, and change control execution. The pipeline is fail-fast: the
//! first failed step halts the run, and a failed build is turned into a
//! readable per-device report before halting.

pub mod config;
pub mod error;
pub mod report;
pub mod runner;

pub use config::WorkflowConfig;
pub use error::{WorkflowError, WorkflowResult};
pub use report::build_failure_report;
pub use runner::{PushOutcome, PushRequest, UpdateSelector, Workflow};
