pub mod error;
pub mod types;

pub use error::{GitHubError, Result};
pub use types::{Owner, Repository, User};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "repofeed";

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    /// Anonymous requests work but are heavily rate limited; pass a token in production.
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Look up a repository by `owner/name`. `Ok(None)` when GitHub has no such repository.
    pub async fn repository(&self, full_name: &str) -> Result<Option<Repository>> {
        if !is_valid_full_name(full_name) {
            return Err(GitHubError::InvalidName(full_name.to_string()));
        }
        let url = format!("{}/repos/{}", self.base_url, full_name);
        self.get_optional(&url).await
    }

    /// Public profile for a login. `Ok(None)` when the user does not exist.
    pub async fn user(&self, login: &str) -> Result<Option<User>> {
        if !is_valid_segment(login) {
            return Ok(None);
        }
        let url = format!("{}/users/{}", self.base_url, login);
        self.get_optional(&url).await
    }

    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(url, "GitHub resource not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

/// `owner/name`, each segment made of GitHub-legal characters.
pub fn is_valid_full_name(full_name: &str) -> bool {
    match full_name.split_once('/') {
        Some((owner, name)) => is_valid_segment(owner) && is_valid_segment(name),
        None => false,
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
