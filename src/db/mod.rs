//! Database layer for post-harvest
//!
//! Handles SQLite persistence for tasks and harvested items.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`tasks`] - Task store CRUD and progress updates
//! - [`items`] - Deduplicated item upserts and per-collection queries

use crate::types::{TaskInfo, TaskKind, TaskStatus};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, sqlite::SqlitePool};
use utoipa::ToSchema;

mod items;
mod migrations;
mod tasks;

pub use items::UpsertOutcome;

/// New task to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Task kind (0=keyword, 1=user, 2=community)
    pub kind: i32,
    /// Query string (keyword, user handle, or community name)
    pub query: String,
    /// Number of items to harvest
    pub target_count: i64,
    /// Collection the task writes into
    pub collection: String,
}

/// Task record from database
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    /// Unique database ID
    pub id: i64,
    /// Task kind (0=keyword, 1=user, 2=community)
    pub kind: i32,
    /// Query string
    pub query: String,
    /// Current status (0=pending, 1=running, 2=completed, 3=failed)
    pub status: i32,
    /// Number of items to harvest
    pub target_count: i64,
    /// Items accepted so far
    pub current_count: i64,
    /// Progress percentage (0.0-100.0), derived from the counts
    pub progress: f32,
    /// Collection the task writes into
    pub collection: String,
    /// Error message if the task failed
    pub error_message: Option<String>,
    /// Unix timestamp when the task was created
    pub created_at: i64,
    /// Unix timestamp when the task completed
    pub completed_at: Option<i64>,
}

impl From<TaskRow> for TaskInfo {
    fn from(row: TaskRow) -> Self {
        TaskInfo {
            id: crate::types::TaskId(row.id),
            kind: TaskKind::from_i32(row.kind),
            query: row.query,
            status: TaskStatus::from_i32(row.status),
            target_count: row.target_count as u32,
            current_count: row.current_count as u32,
            progress: row.progress,
            collection: row.collection,
            error_message: row.error_message,
            created_at: Utc
                .timestamp_opt(row.created_at, 0)
                .single()
                .unwrap_or_else(Utc::now),
            completed_at: row
                .completed_at
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        }
    }
}

/// Harvested item record from database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ItemRow {
    /// Unique database ID
    pub id: i64,
    /// Collection this item belongs to
    pub collection: String,
    /// Source-assigned post id (unique within the collection)
    pub post_id: String,
    /// Author handle
    pub author: String,
    /// Post title
    pub title: String,
    /// Score at the most recent fetch
    pub score: i64,
    /// Link target
    pub url: String,
    /// Unix timestamp of the post's creation on the platform
    pub created_at: i64,
    /// Canonical path on the platform
    pub permalink: String,
    /// Comment count at the most recent fetch
    pub num_comments: i64,
    /// Body text, if the post has one
    pub selftext: Option<String>,
    /// Community the post was made in
    pub community: String,
    /// Kind of task that harvested the item ("keyword", "user", "community")
    pub source_type: String,
    /// Query the harvesting task was created with
    pub query: String,
    /// Unix timestamp when the item was first harvested or last refreshed
    pub scraped_at: i64,
}

/// Database handle for post-harvest
pub struct Database {
    pool: SqlitePool,
}
