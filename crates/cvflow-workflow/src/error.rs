use thiserror::Error;

use cvflow_api::error::ApiError;
use cvflow_inputs::InputsError;
use cvflow_types::ChangeControlId;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Inputs(#[from] InputsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The build finished with failures; `report` is the formatted
    /// per-device breakdown.
    #[error("build failed:\n{report}")]
    BuildFailed { report: String },

    #[error("submit failed: {0}")]
    SubmitFailed(String),

    #[error("change control {id} failed: {error}")]
    ExecutionFailed { id: ChangeControlId, error: String },

    #[error("autofill requested but no action id is configured")]
    MissingActionId,

    #[error("timed out waiting for {stage}")]
    Timeout { stage: &'static str },
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
