use thiserror::Error;

#[derive(Error, Debug)]
pub enum NbError {
    #[error("Could not read dataset: {0}")]
    Read(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NbError>;
