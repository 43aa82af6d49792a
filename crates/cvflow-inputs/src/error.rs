use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {row} is missing required column {column:?}")]
    MissingColumn { column: String, row: usize },
}

pub type InputsResult<T> = Result<T, InputsError>;
