use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use repofeed_common::{Comment, Entry, Vote};

use super::PersistentStore;

const ENTRY_COLUMNS: &str = r#"
    e.id, e.repository_name, e.posted_by, e.created_at,
    COALESCE((SELECT SUM(v.vote_value) FROM votes v
              WHERE v.repository_name = e.repository_name), 0)::BIGINT AS score,
    (SELECT COUNT(*) FROM comments c
     WHERE c.repository_name = e.repository_name) AS comment_count
"#;

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: i64,
    repository_name: String,
    posted_by: String,
    created_at: DateTime<Utc>,
    score: i64,
    comment_count: i64,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.id,
            repository_name: row.repository_name,
            posted_by: row.posted_by,
            created_at: row.created_at,
            score: row.score,
            comment_count: row.comment_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    repository_name: String,
    posted_by: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            repository_name: row.repository_name,
            posted_by: row.posted_by,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VoteRow {
    repository_name: String,
    voter: String,
    vote_value: i32,
}

/// Postgres-backed store. Row-level upserts give per-key atomicity.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PersistentStore for PgStore {
    async fn entry_by_repo_full_name(&self, repo_full_name: &str) -> Result<Option<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.repository_name = $1");
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(repo_full_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Entry::from))
    }

    async fn create_entry(&self, repo_full_name: &str, submitter: &str) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO entries (repository_name, posted_by)
            VALUES ($1, $2)
            ON CONFLICT (repository_name) DO NOTHING
            RETURNING id, repository_name, posted_by, created_at,
                      0::BIGINT AS score, 0::BIGINT AS comment_count
            "#,
        )
        .bind(repo_full_name)
        .bind(submitter)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn entries_with_scores(&self) -> Result<Vec<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e");
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Entry::from).collect())
    }

    async fn record_vote(&self, repo_full_name: &str, voter: &str, value: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO votes (repository_name, voter, vote_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (repository_name, voter) DO UPDATE SET
                vote_value = EXCLUDED.vote_value,
                updated_at = NOW()
            "#,
        )
        .bind(repo_full_name)
        .bind(voter)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn votes_for_entry(&self, repo_full_name: &str) -> Result<Vec<Vote>> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT repository_name, voter, vote_value FROM votes WHERE repository_name = $1",
        )
        .bind(repo_full_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| Vote {
                repository_name: row.repository_name,
                voter: row.voter,
                value: row.vote_value,
            })
            .collect())
    }

    async fn vote_for(&self, repo_full_name: &str, voter: &str) -> Result<Option<i32>> {
        let value = sqlx::query_scalar::<_, i32>(
            "SELECT vote_value FROM votes WHERE repository_name = $1 AND voter = $2",
        )
        .bind(repo_full_name)
        .bind(voter)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn create_comment(
        &self,
        repo_full_name: &str,
        author: &str,
        content: &str,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO comments (repository_name, posted_by, content)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(repo_full_name)
        .bind(author)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn comment_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, repository_name, posted_by, content, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Comment::from))
    }

    async fn comments_for_entry(
        &self,
        repo_full_name: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, repository_name, posted_by, content, created_at
            FROM comments
            WHERE repository_name = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(repo_full_name)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}
