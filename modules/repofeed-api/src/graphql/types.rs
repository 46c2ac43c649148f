// async-graphql's #[Object] proc macro transforms methods into trait impls,
// causing false-positive dead_code warnings on helpers called from macro-expanded resolvers.
#![allow(dead_code)]

use async_graphql::dataloader::DataLoader;
use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};

use github_client::{Owner, Repository, User};
use repofeed_common::{clamp_limit, clamp_offset, Comment, Entry, RepoFeedError, SortPolicy, VoteType};
use repofeed_domains::{hot_score, EnrichmentError, Location, Weather};

use super::context::caller;
use super::error::gql_error;
use super::loaders::UserByLoginLoader;
use crate::ServerDeps;

// --- GraphQL Enums ---

#[derive(async_graphql::Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(name = "FeedType")]
pub enum FeedType {
    Hot,
    New,
    Top,
}

impl From<FeedType> for SortPolicy {
    fn from(t: FeedType) -> Self {
        match t {
            FeedType::Hot => SortPolicy::Hot,
            FeedType::New => SortPolicy::New,
            FeedType::Top => SortPolicy::Top,
        }
    }
}

#[derive(async_graphql::Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(name = "VoteType")]
pub enum GqlVoteType {
    Up,
    Down,
    Cancel,
}

impl From<GqlVoteType> for VoteType {
    fn from(t: GqlVoteType) -> Self {
        match t {
            GqlVoteType::Up => VoteType::Up,
            GqlVoteType::Down => VoteType::Down,
            GqlVoteType::Cancel => VoteType::Cancel,
        }
    }
}

// --- Entry ---

pub struct GqlEntry(pub Entry);

#[Object(name = "Entry")]
impl GqlEntry {
    async fn id(&self) -> i64 {
        self.0.id
    }

    /// GitHub metadata for the submitted repository.
    async fn repository(&self, ctx: &Context<'_>) -> Result<Option<GqlRepository>> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        let repo = deps
            .repositories
            .repository(&self.0.repository_name)
            .await
            .map_err(|e| gql_error(RepoFeedError::Enrichment(e.to_string())))?;
        Ok(repo.map(GqlRepository))
    }

    async fn posted_by(&self, ctx: &Context<'_>) -> Result<Option<GqlUser>> {
        let loader = ctx.data_unchecked::<DataLoader<UserByLoginLoader>>();
        let user = loader
            .load_one(self.0.posted_by.clone())
            .await
            .map_err(|e| gql_error(RepoFeedError::Enrichment(e.to_string())))?;
        Ok(user.map(GqlUser))
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn score(&self) -> i64 {
        self.0.score
    }

    async fn hot_score(&self) -> f64 {
        hot_score(self.0.score, self.0.created_at, Utc::now())
    }

    async fn comment_count(&self) -> i64 {
        self.0.comment_count
    }

    /// Newest first. `limit` is clamped like the feed.
    async fn comments(
        &self,
        ctx: &Context<'_>,
        offset: Option<i32>,
        limit: Option<i32>,
    ) -> Result<Vec<GqlComment>> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        let comments = deps
            .store
            .comments_for_entry(
                &self.0.repository_name,
                clamp_offset(offset.map(i64::from)),
                clamp_limit(limit.map(i64::from)),
            )
            .await
            .map_err(gql_error)?;
        Ok(comments.into_iter().map(GqlComment).collect())
    }

    /// The caller's current vote on this entry; 0 when anonymous or not voted.
    #[graphql(cache_control(private))]
    async fn vote(&self, ctx: &Context<'_>) -> Result<GqlVote> {
        let Some(identity) = caller(ctx) else {
            return Ok(GqlVote { vote_value: 0 });
        };
        let deps = ctx.data_unchecked::<ServerDeps>();
        let vote_value = deps
            .orchestrator
            .ledger()
            .vote_of(&self.0.repository_name, &identity.login)
            .await
            .map_err(gql_error)?;
        Ok(GqlVote { vote_value })
    }
}

#[derive(async_graphql::SimpleObject)]
#[graphql(name = "Vote")]
pub struct GqlVote {
    pub vote_value: i32,
}

// --- Comment ---

pub struct GqlComment(pub Comment);

#[Object(name = "Comment")]
impl GqlComment {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn posted_by(&self, ctx: &Context<'_>) -> Result<Option<GqlUser>> {
        let loader = ctx.data_unchecked::<DataLoader<UserByLoginLoader>>();
        let user = loader
            .load_one(self.0.posted_by.clone())
            .await
            .map_err(|e| gql_error(RepoFeedError::Enrichment(e.to_string())))?;
        Ok(user.map(GqlUser))
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn content(&self) -> &str {
        &self.0.content
    }

    async fn repo_name(&self) -> &str {
        &self.0.repository_name
    }
}

// --- Repository ---

pub struct GqlRepository(pub Repository);

#[Object(name = "Repository")]
impl GqlRepository {
    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn full_name(&self) -> &str {
        &self.0.full_name
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn html_url(&self) -> &str {
        &self.0.html_url
    }

    async fn stargazers_count(&self) -> i64 {
        self.0.stars
    }

    async fn open_issues_count(&self) -> i64 {
        self.0.open_issues
    }

    async fn owner(&self) -> GqlOwner {
        GqlOwner(self.0.owner.clone())
    }
}

pub struct GqlOwner(pub Owner);

#[Object(name = "Owner")]
impl GqlOwner {
    async fn login(&self) -> &str {
        &self.0.login
    }

    async fn avatar_url(&self) -> &str {
        &self.0.avatar_url
    }

    async fn html_url(&self) -> &str {
        &self.0.html_url
    }
}

// --- User ---

pub struct GqlUser(pub User);

#[Object(name = "User")]
impl GqlUser {
    async fn login(&self) -> &str {
        &self.0.login
    }

    async fn avatar_url(&self) -> &str {
        &self.0.avatar_url
    }

    async fn html_url(&self) -> &str {
        &self.0.html_url
    }

    /// Geocoded profile location. Null when the profile has none or the
    /// place can't be matched; a failing geocoder is an error on this field only.
    async fn location(&self, ctx: &Context<'_>) -> Result<Option<GqlLocation>> {
        let Some(place) = self.0.location.as_deref() else {
            return Ok(None);
        };
        let deps = ctx.data_unchecked::<ServerDeps>();
        match deps.geocoder.geocode(place).await {
            Ok(location) => Ok(Some(GqlLocation(location))),
            Err(EnrichmentError::NotFound(_)) => Ok(None),
            Err(e) => {
                tracing::warn!(place, error = %e, "Geocoding failed");
                Err(gql_error(e))
            }
        }
    }
}

// --- Location / Weather ---

pub struct GqlLocation(pub Location);

#[Object(name = "Location")]
impl GqlLocation {
    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn latitude(&self) -> f64 {
        self.0.latitude
    }

    async fn longitude(&self) -> f64 {
        self.0.longitude
    }

    async fn country(&self) -> Option<&str> {
        self.0.country.as_deref()
    }

    /// Current conditions. A failing weather service nulls this field only.
    async fn weather(&self, ctx: &Context<'_>) -> Result<Option<GqlWeather>> {
        let deps = ctx.data_unchecked::<ServerDeps>();
        deps.weather
            .current(self.0.latitude, self.0.longitude)
            .await
            .map(|w| Some(GqlWeather(w)))
            .map_err(|e| {
                tracing::warn!(location = %self.0.name, error = %e, "Weather lookup failed");
                gql_error(e)
            })
    }
}

pub struct GqlWeather(pub Weather);

#[Object(name = "Weather")]
impl GqlWeather {
    async fn temperature_c(&self) -> f64 {
        self.0.temperature_c
    }

    async fn wind_speed_kmh(&self) -> f64 {
        self.0.wind_speed_kmh
    }

    /// WMO weather interpretation code.
    async fn weather_code(&self) -> i32 {
        self.0.weather_code
    }

    async fn observed_at(&self) -> &str {
        &self.0.observed_at
    }
}
