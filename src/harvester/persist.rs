//! Item persistence and progress accounting.

use super::Harvester;
use crate::types::{Event, Post, TaskId, TaskKind, progress_percent};
use std::sync::atomic::Ordering;

impl Harvester {
    /// Persist one fetched post and account for it
    ///
    /// Returns `true` when the post counted toward the task target (it was
    /// new or carried changed fields). Persistence failures are logged and
    /// reported as not-accepted so a single bad row never aborts a task.
    pub(crate) async fn save_post(
        &self,
        task_id: TaskId,
        collection: &str,
        kind: TaskKind,
        query: &str,
        post: &Post,
        new_count: u32,
        target_count: u32,
    ) -> bool {
        let scraped_at = chrono::Utc::now();
        let outcome = match self
            .db
            .upsert_item(collection, post, kind.as_str(), query, scraped_at)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    task_id = task_id.0,
                    post_id = post.id.as_str(),
                    error = %e,
                    "Failed to persist item, skipping"
                );
                return false;
            }
        };

        if !outcome.is_accepted() {
            tracing::debug!(task_id = task_id.0, post_id = post.id.as_str(), "Duplicate item skipped");
            return false;
        }

        self.total_accepted.fetch_add(1, Ordering::SeqCst);

        // The export log is best-effort: the item is already in the database
        if let Err(e) = self.export.append(query, kind, post, scraped_at).await {
            tracing::warn!(
                task_id = task_id.0,
                post_id = post.id.as_str(),
                error = %e,
                "Failed to append item to export log"
            );
        }

        if let Err(e) = self.db.update_task_progress(task_id, new_count).await {
            tracing::error!(task_id = task_id.0, error = %e, "Failed to update task progress");
        }

        self.emit_event(Event::ItemAccepted {
            id: task_id,
            current_count: new_count,
            progress: progress_percent(new_count, target_count),
        });

        true
    }
}
