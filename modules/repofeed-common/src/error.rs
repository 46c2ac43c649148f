use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoFeedError {
    #[error("You must be logged in to {0}")]
    NotAuthenticated(&'static str),

    #[error("Couldn't find repository named \"{0}\"")]
    UnknownRepository(String),

    #[error("Repository \"{0}\" has already been submitted")]
    DuplicateSubmission(String),

    #[error("No entry for repository \"{0}\"")]
    UnknownEntry(String),

    #[error("Enrichment lookup failed: {0}")]
    Enrichment(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl RepoFeedError {
    /// Machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            RepoFeedError::NotAuthenticated(_) => "UNAUTHENTICATED",
            RepoFeedError::UnknownRepository(_) => "UNKNOWN_REPOSITORY",
            RepoFeedError::DuplicateSubmission(_) => "DUPLICATE_SUBMISSION",
            RepoFeedError::UnknownEntry(_) => "UNKNOWN_ENTRY",
            RepoFeedError::Enrichment(_) => "ENRICHMENT_FAILURE",
            RepoFeedError::Store(_) => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, RepoFeedError>;
