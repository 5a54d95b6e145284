use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefectLensError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DefectLensError>;

pub const MISSING_CONFIG_MESSAGE: &str = "Missing required JIRA_* environment variables";
