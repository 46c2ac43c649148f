use async_graphql::dataloader::DataLoader;
use async_graphql::{Context, Object, Result, Schema};

use repofeed_common::RepoFeedError;

use super::context::caller;
use super::error::gql_error;
use super::loaders::UserByLoginLoader;
use super::mutations::MutationRoot;
use super::subscriptions::SubscriptionRoot;
use super::types::{FeedType, GqlEntry, GqlUser};
use crate::ServerDeps;

pub type ApiSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

const MAX_QUERY_DEPTH: usize = 10;
const MAX_QUERY_COMPLEXITY: usize = 1000;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// A page of the ranked feed. `limit` outside 1..=20 falls back to 20.
    #[graphql(cache_control(max_age = 60))]
    async fn feed(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "type")] feed_type: FeedType,
        offset: Option<i32>,
        limit: Option<i32>,
    ) -> Result<Vec<GqlEntry>> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        let page = deps
            .ranker
            .rank(
                feed_type.into(),
                offset.map(i64::from),
                limit.map(i64::from),
            )
            .await
            .map_err(gql_error)?;
        Ok(page.entries.into_iter().map(GqlEntry).collect())
    }

    #[graphql(cache_control(max_age = 60))]
    async fn entry(&self, ctx: &Context<'_>, repo_full_name: String) -> Result<Option<GqlEntry>> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        let entry = deps
            .store
            .entry_by_repo_full_name(&repo_full_name)
            .await
            .map_err(gql_error)?;
        Ok(entry.map(GqlEntry))
    }

    /// The authenticated user's GitHub profile, or null when anonymous.
    #[graphql(cache_control(max_age = 60, private))]
    async fn current_user(&self, ctx: &Context<'_>) -> Result<Option<GqlUser>> {
        let Some(identity) = caller(ctx) else {
            return Ok(None);
        };
        let loader = ctx.data_unchecked::<DataLoader<UserByLoginLoader>>();
        let user = loader
            .load_one(identity.login.clone())
            .await
            .map_err(|e| gql_error(RepoFeedError::Enrichment(e.to_string())))?;
        Ok(user.map(GqlUser))
    }
}

pub fn build_schema(deps: ServerDeps) -> ApiSchema {
    let user_loader = DataLoader::new(
        UserByLoginLoader {
            users: deps.users.clone(),
        },
        tokio::spawn,
    );

    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(deps)
        .data(user_loader)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}
