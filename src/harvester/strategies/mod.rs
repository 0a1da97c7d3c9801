//! Traversal strategies, one per task kind.
//!
//! Each strategy drives a [`StrategyContext`] until the task target is
//! reached or its source is exhausted. Returning `Ok` completes the task
//! (possibly under target); returning `Err` fails it.

mod community;
mod keyword;
mod user;

use super::Harvester;
use crate::db::TaskRow;
use crate::types::{Post, TaskId, TaskKind};
use std::sync::Arc;

/// Per-task working state shared by all strategies
///
/// Holds the task identity, its accepted-item counter, and shortcuts to
/// the harvester's source pool, pacer, and persister.
pub(crate) struct StrategyContext<'a> {
    harvester: &'a Harvester,
    id: TaskId,
    kind: TaskKind,
    query: String,
    collection: String,
    target: u32,
    accepted: u32,
}

impl<'a> StrategyContext<'a> {
    pub(crate) fn new(harvester: &'a Harvester, id: TaskId, row: &TaskRow) -> Self {
        Self {
            harvester,
            id,
            kind: TaskKind::from_i32(row.kind),
            query: row.query.clone(),
            collection: row.collection.clone(),
            target: row.target_count as u32,
            // A resumed task keeps counting from where it stopped
            accepted: row.current_count as u32,
        }
    }

    /// Items accepted so far (cumulative across resumes)
    pub(crate) fn accepted(&self) -> u32 {
        self.accepted
    }

    fn done(&self) -> bool {
        self.accepted >= self.target
    }

    fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.accepted)
    }

    fn retry_budget(&self) -> u32 {
        self.harvester.config.harvest.retry_budget
    }

    fn batch_size(&self) -> u32 {
        self.harvester.config.harvest.batch_size
    }

    /// Pick a source client for the next request (random per request)
    fn source(&self) -> Arc<dyn crate::source::ContentSource> {
        self.harvester.credentials.select()
    }

    /// Persist one post; returns whether it counted toward the target
    async fn save(&mut self, post: &Post) -> bool {
        let new_count = self.accepted + 1;
        let accepted = self
            .harvester
            .save_post(
                self.id,
                &self.collection,
                self.kind,
                &self.query,
                post,
                new_count,
                self.target,
            )
            .await;
        if accepted {
            self.accepted = new_count;
        }
        accepted
    }

    /// Persist a page of posts with the inter-item pause, stopping at the
    /// target. Returns how many of them were accepted.
    async fn save_page(&mut self, posts: &[Post]) -> u32 {
        let mut page_accepted = 0;
        for post in posts {
            if self.done() {
                break;
            }
            if self.save(post).await {
                page_accepted += 1;
            }
            self.harvester.pacer.pause().await;
        }
        page_accepted
    }

    async fn backoff(&self) {
        self.harvester.pacer.backoff().await;
    }
}
