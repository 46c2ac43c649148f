use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on any page of entries or comments.
pub const MAX_PAGE_SIZE: usize = 20;

// --- Identity ---

/// The authenticated caller of a request. Absent means anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub login: String,
}

impl Identity {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

// --- Entry ---

/// A submitted repository. `score` and `comment_count` are derived at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub repository_name: String,
    pub posted_by: String,
    pub created_at: DateTime<Utc>,
    pub score: i64,
    pub comment_count: i64,
}

// --- Comment ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub repository_name: String,
    pub posted_by: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// --- Votes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Up,
    Down,
    Cancel,
}

impl VoteType {
    /// Signed contribution to an entry's score.
    pub fn value(self) -> i32 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
            VoteType::Cancel => 0,
        }
    }
}

/// One voter's standing vote on one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub repository_name: String,
    pub voter: String,
    pub value: i32,
}

// --- Feed ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortPolicy {
    Hot,
    New,
    Top,
}

impl std::fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortPolicy::Hot => write!(f, "HOT"),
            SortPolicy::New => write!(f, "NEW"),
            SortPolicy::Top => write!(f, "TOP"),
        }
    }
}

/// One window of the ranked feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub policy: SortPolicy,
    pub offset: usize,
    pub limit: usize,
    pub entries: Vec<Entry>,
}

/// Clamp a caller-requested page size into `1..=MAX_PAGE_SIZE`.
/// Out-of-range requests (zero, negative, too large) get the maximum.
pub fn clamp_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if (1..=MAX_PAGE_SIZE as i64).contains(&n) => n as usize,
        _ => MAX_PAGE_SIZE,
    }
}

/// Negative offsets are treated as zero.
pub fn clamp_offset(requested: Option<i64>) -> usize {
    requested.unwrap_or(0).max(0) as usize
}
