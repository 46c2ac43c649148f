// Persistence boundary for entries, votes and comments.
//
// MemoryStore backs local runs and tests; PgStore is the Postgres deployment.
// Both derive `Entry::score` and `Entry::comment_count` at read time so the
// score always equals the sum of the standing votes.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;

use repofeed_common::{Comment, Entry, Vote};

#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn entry_by_repo_full_name(&self, repo_full_name: &str) -> Result<Option<Entry>>;

    /// `None` if an entry for this repository already exists. The existence
    /// check and the insert are one atomic step.
    async fn create_entry(&self, repo_full_name: &str, submitter: &str)
        -> Result<Option<Entry>>;

    /// Every entry with its derived score and comment count, unordered.
    async fn entries_with_scores(&self) -> Result<Vec<Entry>>;

    /// Upsert: a second vote by the same voter replaces the first.
    async fn record_vote(&self, repo_full_name: &str, voter: &str, value: i32) -> Result<()>;

    async fn votes_for_entry(&self, repo_full_name: &str) -> Result<Vec<Vote>>;

    async fn vote_for(&self, repo_full_name: &str, voter: &str) -> Result<Option<i32>>;

    /// Returns the id assigned to the new comment.
    async fn create_comment(&self, repo_full_name: &str, author: &str, content: &str)
        -> Result<i64>;

    async fn comment_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Newest first.
    async fn comments_for_entry(
        &self,
        repo_full_name: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Comment>>;
}
