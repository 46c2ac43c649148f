use async_graphql::ErrorExtensions;

use repofeed_common::RepoFeedError;

/// GraphQL-facing wrapper that attaches the `code` extension to domain errors.
#[derive(Debug)]
pub struct ApiError(pub RepoFeedError);

impl From<RepoFeedError> for ApiError {
    fn from(err: RepoFeedError) -> Self {
        Self(err)
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let message = match &self.0 {
            RepoFeedError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let code = self.0.code();
        async_graphql::Error::new(message).extend_with(|_, e| e.set("code", code))
    }
}

pub fn gql_error(err: impl Into<RepoFeedError>) -> async_graphql::Error {
    ApiError(err.into()).extend()
}
