//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task submission and monitoring
//! - [`system`] - Stats, health, events, OpenAPI

use crate::types::{TaskId, TaskKind};
use serde::{Deserialize, Serialize};

mod system;
mod tasks;

pub use system::*;
pub use tasks::*;

/// Request body for POST /tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateTaskRequest {
    /// Traversal strategy: "keyword", "user" or "community"
    pub kind: TaskKind,
    /// Search term, user handle or community name
    pub query: String,
    /// How many items the task should harvest
    pub target_count: u32,
}

/// Response body for POST /tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateTaskResponse {
    /// Id of the queued task
    pub task_id: TaskId,
    /// Collection the task will write into
    pub collection: String,
}
