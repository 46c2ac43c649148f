use serde::{Deserialize, Serialize};

/// Subset of `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    #[serde(rename = "stargazers_count")]
    pub stars: i64,
    #[serde(rename = "open_issues_count")]
    pub open_issues: i64,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}

/// Subset of `GET /users/{login}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub location: Option<String>,
}
