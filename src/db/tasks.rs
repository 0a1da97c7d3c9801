//! Task store CRUD and progress updates.

use crate::error::DatabaseError;
use crate::types::{TaskId, TaskStatus};
use crate::{Error, Result};

use super::{Database, NewTask, TaskRow};

const TASK_COLUMNS: &str = r#"
    id, kind, query, status, target_count, current_count,
    progress, collection, error_message, created_at, completed_at
"#;

impl Database {
    /// Insert a new task record in pending status
    pub async fn insert_task(&self, task: &NewTask) -> Result<TaskId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (
                kind, query, status, target_count, current_count,
                progress, collection, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.kind)
        .bind(&task.query)
        .bind(TaskStatus::Pending.to_i32())
        .bind(task.target_count)
        .bind(0i64) // current_count
        .bind(0.0f32) // progress
        .bind(&task.collection)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert task: {}",
                e
            )))
        })?;

        Ok(TaskId(result.last_insert_rowid()))
    }

    /// Get a task by ID
    pub async fn get_task(&self, id: TaskId) -> Result<Option<TaskRow>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get task: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List all tasks, newest first
    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list tasks: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// List tasks with a specific status, oldest first
    pub async fn list_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<TaskRow>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(status.to_i32())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list tasks by status: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Update task status
    pub async fn update_task_status(&self, id: TaskId, status: TaskStatus) -> Result<()> {
        sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
            .bind(status.to_i32())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update task status: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Update accepted-item count; progress is recomputed from the counts
    pub async fn update_task_progress(&self, id: TaskId, current_count: u32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET current_count = ?,
                progress = CASE
                    WHEN target_count > 0 THEN 100.0 * ? / target_count
                    ELSE 0.0
                END
            WHERE id = ?
            "#,
        )
        .bind(current_count as i64)
        .bind(current_count as i64)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update task progress: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Mark a task completed and stamp completed_at
    pub async fn set_task_completed(&self, id: TaskId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("UPDATE tasks SET status = ?, completed_at = ? WHERE id = ?")
            .bind(TaskStatus::Completed.to_i32())
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to set task completed: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Mark a task failed with the captured error message
    pub async fn set_task_failed(&self, id: TaskId, error: &str) -> Result<()> {
        sqlx::query("UPDATE tasks SET status = ?, error_message = ? WHERE id = ?")
            .bind(TaskStatus::Failed.to_i32())
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to set task failed: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Tasks that were pending or running when the process last stopped
    ///
    /// Used at startup to re-enqueue interrupted work; callers reset the
    /// status to pending before queueing.
    pub async fn list_resumable_tasks(&self) -> Result<Vec<TaskRow>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status IN (?, ?) ORDER BY created_at ASC, id ASC"
        ))
        .bind(TaskStatus::Pending.to_i32())
        .bind(TaskStatus::Running.to_i32())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list resumable tasks: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}
