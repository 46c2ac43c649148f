//! Mutation sequencing.
//!
//! Each mutation runs AuthCheck → Precondition → Effect → Notify → Reread and
//! stops at the first failing step, so a rejected request never leaves a
//! partial write behind.

use std::sync::Arc;

use tracing::info;

use repofeed_common::{Comment, Entry, Identity, RepoFeedError, Result, VoteType};
use repofeed_events::NotificationDispatcher;

use crate::directory::RepositoryDirectory;
use crate::ledger::VoteLedger;
use crate::store::PersistentStore;

#[derive(Clone)]
pub struct MutationOrchestrator {
    store: Arc<dyn PersistentStore>,
    directory: Arc<dyn RepositoryDirectory>,
    ledger: VoteLedger,
    notifier: NotificationDispatcher,
}

impl MutationOrchestrator {
    pub fn new(
        store: Arc<dyn PersistentStore>,
        directory: Arc<dyn RepositoryDirectory>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            ledger: VoteLedger::new(store.clone()),
            store,
            directory,
            notifier,
        }
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub async fn submit_repository(
        &self,
        caller: Option<&Identity>,
        repo_full_name: &str,
    ) -> Result<Entry> {
        let caller = caller.ok_or(RepoFeedError::NotAuthenticated("submit a repository"))?;

        if !self.directory.exists(repo_full_name).await? {
            return Err(RepoFeedError::UnknownRepository(repo_full_name.to_string()));
        }
        if self
            .store
            .entry_by_repo_full_name(repo_full_name)
            .await?
            .is_some()
        {
            return Err(RepoFeedError::DuplicateSubmission(
                repo_full_name.to_string(),
            ));
        }

        // A concurrent submitter can win between the check above and this insert.
        let Some(created) = self.store.create_entry(repo_full_name, &caller.login).await? else {
            return Err(RepoFeedError::DuplicateSubmission(
                repo_full_name.to_string(),
            ));
        };
        info!(
            repository = %repo_full_name,
            submitter = %caller.login,
            entry_id = created.id,
            "Repository submitted"
        );

        self.reread_entry(repo_full_name).await
    }

    pub async fn submit_comment(
        &self,
        caller: Option<&Identity>,
        repo_full_name: &str,
        content: &str,
    ) -> Result<Comment> {
        let caller = caller.ok_or(RepoFeedError::NotAuthenticated("comment"))?;

        if self
            .store
            .entry_by_repo_full_name(repo_full_name)
            .await?
            .is_none()
        {
            return Err(RepoFeedError::UnknownEntry(repo_full_name.to_string()));
        }

        let id = self
            .store
            .create_comment(repo_full_name, &caller.login, content)
            .await?;

        // Subscribers get the persisted row, not the request payload.
        let comment = self
            .store
            .comment_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("comment {id} missing after insert"))?;

        info!(
            repository = %repo_full_name,
            author = %caller.login,
            comment_id = id,
            "Comment submitted"
        );
        self.notifier.notify_comment_added(comment.clone());

        Ok(comment)
    }

    pub async fn vote(
        &self,
        caller: Option<&Identity>,
        repo_full_name: &str,
        vote_type: VoteType,
    ) -> Result<Entry> {
        self.ledger
            .cast_vote(repo_full_name, caller, vote_type)
            .await?;
        self.reread_entry(repo_full_name).await
    }

    async fn reread_entry(&self, repo_full_name: &str) -> Result<Entry> {
        self.store
            .entry_by_repo_full_name(repo_full_name)
            .await?
            .ok_or_else(|| RepoFeedError::UnknownEntry(repo_full_name.to_string()))
    }
}
