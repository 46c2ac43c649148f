use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitHubError>;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid repository name: {0}")]
    InvalidName(String),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GitHubError {
    fn from(err: serde_json::Error) -> Self {
        GitHubError::Parse(err.to_string())
    }
}
