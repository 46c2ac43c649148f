use async_graphql::{Context, Object, Result};

use super::context::caller;
use super::error::gql_error;
use super::types::{GqlComment, GqlEntry, GqlVoteType};
use crate::ServerDeps;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Submit a GitHub repository to the feed. Requires login.
    async fn submit_repository(
        &self,
        ctx: &Context<'_>,
        repo_full_name: String,
    ) -> Result<GqlEntry> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        deps.orchestrator
            .submit_repository(caller(ctx), &repo_full_name)
            .await
            .map(GqlEntry)
            .map_err(gql_error)
    }

    /// Vote on an entry. CANCEL clears the caller's vote.
    async fn vote(
        &self,
        ctx: &Context<'_>,
        repo_full_name: String,
        #[graphql(name = "type")] vote_type: GqlVoteType,
    ) -> Result<GqlEntry> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        deps.orchestrator
            .vote(caller(ctx), &repo_full_name, vote_type.into())
            .await
            .map(GqlEntry)
            .map_err(gql_error)
    }

    async fn submit_comment(
        &self,
        ctx: &Context<'_>,
        repo_full_name: String,
        comment_content: String,
    ) -> Result<GqlComment> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        deps.orchestrator
            .submit_comment(caller(ctx), &repo_full_name, &comment_content)
            .await
            .map(GqlComment)
            .map_err(gql_error)
    }
}
