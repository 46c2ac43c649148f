use std::sync::Arc;

use tracing::info;

use repofeed_common::{Identity, RepoFeedError, Result, VoteType};

use crate::store::PersistentStore;

/// Per-voter vote records and the scores derived from them.
///
/// Votes are upserts keyed by (entry, voter): flipping UP to DOWN moves the
/// score by two, CANCEL removes the voter's contribution.
#[derive(Clone)]
pub struct VoteLedger {
    store: Arc<dyn PersistentStore>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// Record `vote` for `voter`, returning the entry's new score.
    pub async fn cast_vote(
        &self,
        repo_full_name: &str,
        voter: Option<&Identity>,
        vote: VoteType,
    ) -> Result<i64> {
        let voter = voter.ok_or(RepoFeedError::NotAuthenticated("vote"))?;

        if self
            .store
            .entry_by_repo_full_name(repo_full_name)
            .await?
            .is_none()
        {
            return Err(RepoFeedError::UnknownEntry(repo_full_name.to_string()));
        }

        self.store
            .record_vote(repo_full_name, &voter.login, vote.value())
            .await?;

        let score = self.current_score(repo_full_name).await?;
        info!(
            repository = %repo_full_name,
            voter = %voter.login,
            value = vote.value(),
            score,
            "Vote recorded"
        );
        Ok(score)
    }

    pub async fn current_score(&self, repo_full_name: &str) -> Result<i64> {
        let votes = self.store.votes_for_entry(repo_full_name).await?;
        Ok(votes.iter().map(|v| i64::from(v.value)).sum())
    }

    /// The voter's standing vote, 0 if they never voted.
    pub async fn vote_of(&self, repo_full_name: &str, voter: &str) -> Result<i32> {
        Ok(self
            .store
            .vote_for(repo_full_name, voter)
            .await?
            .unwrap_or(0))
    }
}
