use async_graphql::{Context, Subscription};
use futures::{Stream, StreamExt};

use super::types::GqlComment;
use crate::ServerDeps;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Comments posted on one repository's entry from now on. No backlog.
    async fn comment_added(
        &self,
        ctx: &Context<'_>,
        repo_full_name: String,
    ) -> impl Stream<Item = GqlComment> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        tracing::debug!(repository = %repo_full_name, "commentAdded subscription opened");
        deps.dispatcher
            .comment_added(&repo_full_name)
            .into_stream()
            .map(|event| GqlComment((*event.comment).clone()))
    }
}
