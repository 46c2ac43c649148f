// Lookups against the code host (GitHub).
//
// RepositoryDirectory: does a repository exist, and its public metadata.
// UserDirectory: public profiles by login, batched for DataLoader use.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use github_client::{GitHubClient, GitHubError, Repository, User};

#[async_trait]
pub trait RepositoryDirectory: Send + Sync {
    async fn repository(&self, repo_full_name: &str) -> Result<Option<Repository>>;

    async fn exists(&self, repo_full_name: &str) -> Result<bool> {
        Ok(self.repository(repo_full_name).await?.is_some())
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Profiles for the given logins. Unknown logins are simply absent from the map.
    async fn users(&self, logins: &[String]) -> Result<HashMap<String, User>>;
}

#[async_trait]
impl RepositoryDirectory for GitHubClient {
    async fn repository(&self, repo_full_name: &str) -> Result<Option<Repository>> {
        match GitHubClient::repository(self, repo_full_name).await {
            Ok(repo) => Ok(repo),
            Err(GitHubError::InvalidName(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl UserDirectory for GitHubClient {
    async fn users(&self, logins: &[String]) -> Result<HashMap<String, User>> {
        let lookups = logins.iter().map(|login| self.user(login));
        let results = join_all(lookups).await;

        let mut users = HashMap::new();
        for (login, result) in logins.iter().zip(results) {
            match result {
                Ok(Some(user)) => {
                    users.insert(login.clone(), user);
                }
                Ok(None) => tracing::debug!(login = %login, "GitHub user not found"),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(users)
    }
}
