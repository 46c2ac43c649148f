use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use repofeed_common::{clamp_limit, clamp_offset, Entry, FeedPage, Result, SortPolicy};

use crate::store::PersistentStore;

/// Seconds of age that cost as much as a tenfold score difference.
pub const HOT_DECAY_SECS: f64 = 45_000.0;

/// Score-and-recency blend for the HOT feed.
///
/// `sign(score) * log10(1 + |score|) - age / HOT_DECAY_SECS`: strictly
/// increasing in score, strictly decreasing in age, and a pure function of
/// both. Ages in the future count as zero.
pub fn hot_score(score: i64, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let magnitude = (1.0 + score.unsigned_abs() as f64).log10();
    let age_secs = (now - created_at).num_milliseconds().max(0) as f64 / 1000.0;
    score.signum() as f64 * magnitude - age_secs / HOT_DECAY_SECS
}

fn newest_first(a: &Entry, b: &Entry) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.repository_name.cmp(&b.repository_name))
}

/// Sort `entries` in place for `policy` as of `now`.
pub fn order_entries(entries: &mut Vec<Entry>, policy: SortPolicy, now: DateTime<Utc>) {
    match policy {
        SortPolicy::New => entries.sort_by(newest_first),
        SortPolicy::Top => {
            entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| newest_first(a, b)))
        }
        SortPolicy::Hot => {
            let mut scored: Vec<(f64, Entry)> = entries
                .drain(..)
                .map(|e| (hot_score(e.score, e.created_at, now), e))
                .collect();
            scored.sort_by(|(ha, a), (hb, b)| hb.total_cmp(ha).then_with(|| newest_first(a, b)));
            entries.extend(scored.into_iter().map(|(_, e)| e));
        }
    }
}

/// Serves ordered, paginated windows of the feed.
#[derive(Clone)]
pub struct FeedRanker {
    store: Arc<dyn PersistentStore>,
}

impl FeedRanker {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// `limit` is clamped to 1..=20 (out-of-range values become 20); an offset
    /// past the end yields an empty page.
    pub async fn rank(
        &self,
        policy: SortPolicy,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<FeedPage> {
        self.rank_at(policy, offset, limit, Utc::now()).await
    }

    pub async fn rank_at(
        &self,
        policy: SortPolicy,
        offset: Option<i64>,
        limit: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<FeedPage> {
        let offset = clamp_offset(offset);
        let limit = clamp_limit(limit);

        let mut entries = self.store.entries_with_scores().await?;
        let total = entries.len();
        order_entries(&mut entries, policy, now);

        let entries: Vec<Entry> = entries.into_iter().skip(offset).take(limit).collect();
        debug!(%policy, offset, limit, total, returned = entries.len(), "Feed ranked");

        Ok(FeedPage {
            policy,
            offset,
            limit,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn entry(name: &str, score: i64, hours_ago: i64, now: DateTime<Utc>) -> Entry {
        Entry {
            id: 0,
            repository_name: name.to_string(),
            posted_by: "someone".to_string(),
            created_at: now - Duration::hours(hours_ago),
            score,
            comment_count: 0,
        }
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.repository_name.as_str()).collect()
    }

    #[test]
    fn hot_prefers_higher_score_at_equal_age() {
        let now = Utc::now();
        let created = now - Duration::hours(5);
        assert!(hot_score(10, created, now) > hot_score(9, created, now));
        assert!(hot_score(1, created, now) > hot_score(0, created, now));
        assert!(hot_score(0, created, now) > hot_score(-1, created, now));
    }

    #[test]
    fn hot_prefers_recent_at_equal_score() {
        let now = Utc::now();
        for score in [-5, 0, 5] {
            assert!(
                hot_score(score, now - Duration::hours(1), now)
                    > hot_score(score, now - Duration::hours(2), now),
                "score {score}"
            );
        }
    }

    #[test]
    fn hot_is_pure() {
        let now = Utc::now();
        let created = now - Duration::minutes(90);
        assert_eq!(hot_score(3, created, now), hot_score(3, created, now));
    }

    #[test]
    fn new_orders_by_recency_then_name() {
        let now = Utc::now();
        let mut entries = vec![
            entry("old/high", 100, 10, now),
            entry("b/tie", 0, 1, now),
            entry("a/tie", 0, 1, now),
            entry("fresh/low", -3, 0, now),
        ];
        order_entries(&mut entries, SortPolicy::New, now);
        assert_eq!(names(&entries), vec!["fresh/low", "a/tie", "b/tie", "old/high"]);
    }

    #[test]
    fn top_orders_by_score_then_recency() {
        let now = Utc::now();
        let mut entries = vec![
            entry("low/new", 1, 0, now),
            entry("high/old", 5, 20, now),
            entry("high/new", 5, 2, now),
        ];
        order_entries(&mut entries, SortPolicy::Top, now);
        assert_eq!(names(&entries), vec!["high/new", "high/old", "low/new"]);
    }

    #[test]
    fn hot_sinks_old_entries() {
        let now = Utc::now();
        let mut entries = vec![
            entry("week-old/popular", 50, 24 * 7, now),
            entry("hour-old/modest", 5, 1, now),
        ];
        order_entries(&mut entries, SortPolicy::Hot, now);
        assert_eq!(names(&entries), vec!["hour-old/modest", "week-old/popular"]);
    }

    async fn seeded_ranker(count: i64) -> FeedRanker {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for i in 0..count {
            store
                .insert_entry_at(&format!("owner/repo-{i}"), "alice", now - Duration::hours(i))
                .await
                .unwrap();
        }
        FeedRanker::new(store)
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let ranker = seeded_ranker(30).await;
        for requested in [500, 0, -1] {
            let page = ranker.rank(SortPolicy::New, None, Some(requested)).await.unwrap();
            assert_eq!(page.limit, 20);
            assert_eq!(page.entries.len(), 20);
        }
        let page = ranker.rank(SortPolicy::New, None, Some(10)).await.unwrap();
        assert_eq!(page.entries.len(), 10);
    }

    #[tokio::test]
    async fn offset_past_end_is_empty() {
        let ranker = seeded_ranker(3).await;
        let page = ranker
            .rank(SortPolicy::Top, Some(1000), Some(20))
            .await
            .unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.offset, 1000);
    }

    #[tokio::test]
    async fn pages_do_not_overlap() {
        let ranker = seeded_ranker(7).await;
        let first = ranker.rank(SortPolicy::New, Some(0), Some(4)).await.unwrap();
        let second = ranker.rank(SortPolicy::New, Some(4), Some(4)).await.unwrap();
        assert_eq!(first.entries.len(), 4);
        assert_eq!(second.entries.len(), 3);
        assert_eq!(second.entries[0].repository_name, "owner/repo-4");
    }
}
