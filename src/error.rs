use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bitbucket API error: {0}")]
    BitbucketApi(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Properties file not found: {0}")]
    MissingProperties(String),

    #[error("Version control operation failed: {0}")]
    VersionControl(String),

    #[error("Scan failed: {0}")]
    Scan(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<git2::Error> for AppError {
    fn from(e: git2::Error) -> Self {
        AppError::Workspace(e.message().to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
