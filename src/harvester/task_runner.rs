//! Per-task lifecycle state machine.

use super::Harvester;
use super::strategies::StrategyContext;
use crate::types::{Event, TaskId, TaskKind, TaskStatus};

impl Harvester {
    /// Run a single task to a terminal state
    ///
    /// Loads the task, marks it running, dispatches the traversal for its
    /// kind, and records the outcome. A strategy returning `Ok` completes
    /// the task even if it collected fewer items than the target; an `Err`
    /// fails it with the error message preserved for operators.
    pub(crate) async fn run_task(&self, id: TaskId) {
        let row = match self.db.get_task(id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::error!(task_id = id.0, "Queued task no longer exists, skipping");
                return;
            }
            Err(e) => {
                tracing::error!(task_id = id.0, error = %e, "Failed to load queued task");
                return;
            }
        };

        let kind = TaskKind::from_i32(row.kind);
        if let Err(e) = self.db.update_task_status(id, TaskStatus::Running).await {
            tracing::error!(task_id = id.0, error = %e, "Failed to mark task running");
            return;
        }
        tracing::info!(task_id = id.0, kind = %kind, query = row.query.as_str(), "Task started");
        self.emit_event(Event::TaskStarted { id });

        let mut ctx = StrategyContext::new(self, id, &row);
        let result = match kind {
            TaskKind::Keyword => ctx.run_keyword().await,
            TaskKind::User => ctx.run_user().await,
            TaskKind::Community => ctx.run_community().await,
        };

        let accepted = ctx.accepted();
        match result {
            Ok(()) => {
                if let Err(e) = self.db.set_task_completed(id).await {
                    tracing::error!(task_id = id.0, error = %e, "Failed to mark task completed");
                }
                tracing::info!(
                    task_id = id.0,
                    accepted,
                    target = row.target_count,
                    "Task completed"
                );
                self.emit_event(Event::TaskCompleted {
                    id,
                    current_count: accepted,
                });
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(db_err) = self.db.set_task_failed(id, &message).await {
                    tracing::error!(task_id = id.0, error = %db_err, "Failed to mark task failed");
                }
                tracing::error!(task_id = id.0, accepted, error = message.as_str(), "Task failed");
                self.emit_event(Event::TaskFailed { id, error: message });
            }
        }
    }
}
