use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use repofeed_common::{Comment, Entry, Vote};

use super::PersistentStore;

struct StoredEntry {
    id: i64,
    posted_by: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    entries: BTreeMap<String, StoredEntry>,
    // (repository, voter) -> value
    votes: HashMap<(String, String), i32>,
    comments: Vec<Comment>,
    next_entry_id: i64,
    next_comment_id: i64,
}

impl State {
    fn score(&self, repo_full_name: &str) -> i64 {
        self.votes
            .iter()
            .filter(|((repo, _), _)| repo == repo_full_name)
            .map(|(_, value)| i64::from(*value))
            .sum()
    }

    fn comment_count(&self, repo_full_name: &str) -> i64 {
        self.comments
            .iter()
            .filter(|c| c.repository_name == repo_full_name)
            .count() as i64
    }

    fn entry(&self, repo_full_name: &str) -> Option<Entry> {
        self.entries.get(repo_full_name).map(|stored| Entry {
            id: stored.id,
            repository_name: repo_full_name.to_string(),
            posted_by: stored.posted_by.clone(),
            created_at: stored.created_at,
            score: self.score(repo_full_name),
            comment_count: self.comment_count(repo_full_name),
        })
    }
}

/// In-process store. Per-call atomicity comes from a single `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry with an explicit creation time (seeding and tests).
    /// `None` if the repository already has an entry.
    pub async fn insert_entry_at(
        &self,
        repo_full_name: &str,
        submitter: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Entry>> {
        let mut state = self.state.write().await;
        if state.entries.contains_key(repo_full_name) {
            return Ok(None);
        }
        state.next_entry_id += 1;
        let id = state.next_entry_id;
        state.entries.insert(
            repo_full_name.to_string(),
            StoredEntry {
                id,
                posted_by: submitter.to_string(),
                created_at,
            },
        );
        state
            .entry(repo_full_name)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("entry vanished after insert"))
    }

    pub async fn vote_count(&self) -> usize {
        self.state.read().await.votes.len()
    }

    pub async fn comment_count(&self) -> usize {
        self.state.read().await.comments.len()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn entry_by_repo_full_name(&self, repo_full_name: &str) -> Result<Option<Entry>> {
        Ok(self.state.read().await.entry(repo_full_name))
    }

    async fn create_entry(&self, repo_full_name: &str, submitter: &str) -> Result<Option<Entry>> {
        self.insert_entry_at(repo_full_name, submitter, Utc::now())
            .await
    }

    async fn entries_with_scores(&self) -> Result<Vec<Entry>> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .keys()
            .filter_map(|name| state.entry(name))
            .collect())
    }

    async fn record_vote(&self, repo_full_name: &str, voter: &str, value: i32) -> Result<()> {
        if !(-1..=1).contains(&value) {
            bail!("vote value {value} out of range");
        }
        let mut state = self.state.write().await;
        if !state.entries.contains_key(repo_full_name) {
            bail!("no entry for {repo_full_name}");
        }
        state
            .votes
            .insert((repo_full_name.to_string(), voter.to_string()), value);
        Ok(())
    }

    async fn votes_for_entry(&self, repo_full_name: &str) -> Result<Vec<Vote>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .iter()
            .filter(|((repo, _), _)| repo == repo_full_name)
            .map(|((repo, voter), value)| Vote {
                repository_name: repo.clone(),
                voter: voter.clone(),
                value: *value,
            })
            .collect())
    }

    async fn vote_for(&self, repo_full_name: &str, voter: &str) -> Result<Option<i32>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .get(&(repo_full_name.to_string(), voter.to_string()))
            .copied())
    }

    async fn create_comment(
        &self,
        repo_full_name: &str,
        author: &str,
        content: &str,
    ) -> Result<i64> {
        let mut state = self.state.write().await;
        if !state.entries.contains_key(repo_full_name) {
            bail!("no entry for {repo_full_name}");
        }
        state.next_comment_id += 1;
        let id = state.next_comment_id;
        state.comments.push(Comment {
            id,
            repository_name: repo_full_name.to_string(),
            posted_by: author.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn comment_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn comments_for_entry(
        &self,
        repo_full_name: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        // Ids are assigned in creation order, so reverse insertion order is newest first.
        Ok(state
            .comments
            .iter()
            .rev()
            .filter(|c| c.repository_name == repo_full_name)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
