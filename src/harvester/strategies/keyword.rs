//! Keyword search traversal.

use super::StrategyContext;
use crate::error::{Error, Result};
use crate::retry::fetch_with_budget;
use crate::types::{SortOrder, TimeWindow};

impl StrategyContext<'_> {
    /// Relevance-sorted search loop with a consecutive-failure budget
    ///
    /// Fetches oversized pages (the search endpoint returns heavy overlap
    /// between calls) and relies on dedup to detect exhaustion: a page
    /// that accepts nothing means the search has no more new results.
    /// The budget resets on any successful fetch; exhausting it fails
    /// the task.
    pub(crate) async fn run_keyword(&mut self) -> Result<()> {
        let budget = self.retry_budget();

        while !self.done() {
            let limit = (2 * self.batch_size()).min(self.remaining());
            let page = fetch_with_budget(budget, &self.harvester.pacer, || {
                // Re-pick a credential for every attempt
                let source = self.source();
                let query = self.query.clone();
                async move {
                    source
                        .search(&query, SortOrder::Relevance, limit, TimeWindow::All)
                        .await
                }
            })
            .await
            .map_err(|e| Error::Task(format!("search gave up: {e}")))?;

            if page.is_empty() {
                tracing::info!(task_id = self.id.0, "Search returned no results, stopping");
                break;
            }

            let page_accepted = self.save_page(&page).await;
            if page_accepted == 0 && !self.done() {
                // Cursorless endpoint: an all-duplicate page will repeat forever
                tracing::info!(
                    task_id = self.id.0,
                    accepted = self.accepted(),
                    "Search page was entirely duplicates, stopping"
                );
                break;
            }
        }

        Ok(())
    }
}
