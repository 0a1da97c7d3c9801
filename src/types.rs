//! Core types for post-harvest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a harvest task
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<TaskId> for i64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for TaskId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl PartialEq<TaskId> for i64 {
    fn eq(&self, other: &TaskId) -> bool {
        *self == other.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for TaskId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Persisted but not yet picked up by a worker
    Pending,
    /// Currently executing its traversal strategy
    Running,
    /// Strategy returned normally (terminal)
    Completed,
    /// Strategy error escaped (terminal)
    Failed,
}

impl TaskStatus {
    /// Convert integer status code to TaskStatus enum
    pub fn from_i32(status: i32) -> Self {
        match status {
            0 => TaskStatus::Pending,
            1 => TaskStatus::Running,
            2 => TaskStatus::Completed,
            3 => TaskStatus::Failed,
            _ => TaskStatus::Failed, // Default to Failed for unknown status
        }
    }

    /// Convert TaskStatus enum to integer status code
    pub fn to_i32(&self) -> i32 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Running => 1,
            TaskStatus::Completed => 2,
            TaskStatus::Failed => 3,
        }
    }

    /// Whether the status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Task kind - decides the traversal strategy, chosen once at creation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Relevance-sorted keyword search across the whole platform
    Keyword,
    /// A single user's submission feed, newest first
    User,
    /// A community feed with the new → hot → top cascade
    Community,
}

impl TaskKind {
    /// Convert integer kind code to TaskKind
    pub fn from_i32(kind: i32) -> Self {
        match kind {
            0 => TaskKind::Keyword,
            1 => TaskKind::User,
            _ => TaskKind::Community,
        }
    }

    /// Convert TaskKind to integer kind code
    pub fn to_i32(&self) -> i32 {
        match self {
            TaskKind::Keyword => 0,
            TaskKind::User => 1,
            TaskKind::Community => 2,
        }
    }

    /// Stable lowercase label, used for the item `source_type` column and
    /// the export log
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Keyword => "keyword",
            TaskKind::User => "user",
            TaskKind::Community => "community",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing sort order supported by the platform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first
    New,
    /// Currently trending
    Hot,
    /// Highest scored within a time window
    Top,
    /// Best match for a search query
    Relevance,
}

impl SortOrder {
    /// Platform API path/parameter segment
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::New => "new",
            SortOrder::Hot => "hot",
            SortOrder::Top => "top",
            SortOrder::Relevance => "relevance",
        }
    }
}

/// Time window for `top` listings and searches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// Past hour
    Hour,
    /// Past day
    Day,
    /// Past week
    Week,
    /// Past month
    Month,
    /// Past year
    Year,
    /// All time
    All,
}

impl TimeWindow {
    /// The fixed fan-out order the community cascade uses under `top`
    pub const CASCADE_ORDER: [TimeWindow; 6] = [
        TimeWindow::Hour,
        TimeWindow::Day,
        TimeWindow::Week,
        TimeWindow::Month,
        TimeWindow::Year,
        TimeWindow::All,
    ];

    /// Platform API parameter value
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }
}

/// A post as returned by the content platform
///
/// Optional fields are explicit `Option`s; absence is a value, not a
/// missing attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    /// Source-assigned id, unique within the platform
    pub id: String,
    /// Author handle
    pub author: String,
    /// Post title
    pub title: String,
    /// Current score
    pub score: i64,
    /// Link target (external URL or self link)
    pub url: String,
    /// Original creation time on the platform
    pub created_at: DateTime<Utc>,
    /// Canonical path on the platform
    pub permalink: String,
    /// Number of comments at fetch time
    pub num_comments: i64,
    /// Body text, if the post has one
    pub selftext: Option<String>,
    /// Community the post was made in
    pub community: String,
}

/// Task record as exposed through the API
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskInfo {
    /// Task ID
    pub id: TaskId,
    /// Task kind
    pub kind: TaskKind,
    /// Query string (keyword, user handle, or community name)
    pub query: String,
    /// Current status
    pub status: TaskStatus,
    /// Number of items the task should harvest
    pub target_count: u32,
    /// Number of items accepted so far
    pub current_count: u32,
    /// Progress percentage, 100 * current_count / target_count
    pub progress: f32,
    /// Collection the task writes into
    pub collection: String,
    /// Error message if the task failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task reached a terminal state (completed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Harvester-wide counters for backpressure visibility
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
pub struct HarvestStats {
    /// Items accepted (inserted or updated) since process start
    pub total_accepted: u64,
    /// Tasks waiting in the queue
    pub queue_depth: usize,
    /// Tasks currently running (workers in use)
    pub running: usize,
    /// Configured worker pool size
    pub max_concurrent_tasks: usize,
}

/// Event emitted during the task lifecycle
///
/// Advisory only: task visibility for API callers is polling the task
/// store. Embedding applications can subscribe for logging or UI updates.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task persisted and queued
    TaskQueued {
        /// Task ID
        id: TaskId,
        /// Task kind
        kind: TaskKind,
        /// Query string
        query: String,
    },

    /// Task picked up by a worker
    TaskStarted {
        /// Task ID
        id: TaskId,
    },

    /// An item was accepted for this task
    ItemAccepted {
        /// Task ID
        id: TaskId,
        /// Accepted items so far
        current_count: u32,
        /// Progress percentage
        progress: f32,
    },

    /// Task reached its target or exhausted its source
    TaskCompleted {
        /// Task ID
        id: TaskId,
        /// Items accepted in total
        current_count: u32,
    },

    /// A strategy error escaped and the task was marked failed
    TaskFailed {
        /// Task ID
        id: TaskId,
        /// Captured error message
        error: String,
    },
}

/// Derive the storage collection name from a task query
///
/// Lower-cased so that "Formula1" and "formula1" share one collection.
pub fn collection_name(query: &str) -> String {
    format!("posts_{}", query.to_lowercase())
}

/// Recompute the advisory progress percentage from the counts
///
/// Always derived, never stored independently of this relation.
pub fn progress_percent(current_count: u32, target_count: u32) -> f32 {
    if target_count == 0 {
        return 0.0;
    }
    (current_count as f32 / target_count as f32) * 100.0
}
