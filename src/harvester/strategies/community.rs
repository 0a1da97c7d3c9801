//! Community feed traversal with the new → hot → top cascade.

use super::StrategyContext;
use crate::error::{Error, Result};
use crate::types::{Post, SortOrder, TimeWindow};

/// Outcome of one cascade pass
struct PassOutcome {
    accepted: u32,
    any_fetch_succeeded: bool,
}

impl StrategyContext<'_> {
    /// Repeated cascade passes until the target is met or the community
    /// is exhausted
    ///
    /// Each pass tries `new` first and falls back to `hot`, then `top`
    /// across the fixed time-window ladder, as soon as a stage accepts
    /// nothing. A pass where every fetch failed consumes the retry budget
    /// and sleeps the backoff; a pass that reached the platform but
    /// accepted nothing means there is nothing left to gather.
    pub(crate) async fn run_community(&mut self) -> Result<()> {
        let budget = self.retry_budget();
        let mut failures: u32 = 0;

        while !self.done() {
            let outcome = self.cascade_pass().await;

            if !outcome.any_fetch_succeeded {
                failures += 1;
                tracing::warn!(
                    task_id = self.id.0,
                    failures,
                    budget,
                    "Every fetch in the cascade pass failed"
                );
                if failures >= budget {
                    return Err(Error::Task(format!(
                        "community feed unreachable after {failures} consecutive failed passes"
                    )));
                }
                self.backoff().await;
                continue;
            }
            failures = 0;

            if outcome.accepted == 0 {
                tracing::info!(
                    task_id = self.id.0,
                    accepted = self.accepted(),
                    "Cascade accepted nothing new, community exhausted"
                );
                break;
            }
        }

        Ok(())
    }

    /// One pass: new, then hot, then top over each time window
    ///
    /// Later stages only run while the pass has accepted nothing, so a
    /// productive `new` page never triggers the fallbacks.
    async fn cascade_pass(&mut self) -> PassOutcome {
        let mut outcome = PassOutcome {
            accepted: 0,
            any_fetch_succeeded: false,
        };

        self.cascade_stage(SortOrder::New, TimeWindow::All, &mut outcome)
            .await;

        if outcome.accepted == 0 && !self.done() {
            self.cascade_stage(SortOrder::Hot, TimeWindow::All, &mut outcome)
                .await;
        }

        for window in TimeWindow::CASCADE_ORDER {
            if outcome.accepted > 0 || self.done() {
                break;
            }
            self.cascade_stage(SortOrder::Top, window, &mut outcome).await;
        }

        outcome
    }

    /// Fetch one listing and persist it; fetch errors stay inside the pass
    async fn cascade_stage(
        &mut self,
        sort: SortOrder,
        window: TimeWindow,
        outcome: &mut PassOutcome,
    ) {
        let limit = self.batch_size().min(self.remaining());
        match self
            .source()
            .community_feed(&self.query, sort, limit, window)
            .await
        {
            Ok(mut posts) => {
                outcome.any_fetch_succeeded = true;
                // Hot and top listings come back in rank order; persist
                // newest-first so partial runs keep the freshest posts
                if sort != SortOrder::New {
                    sort_newest_first(&mut posts);
                }
                outcome.accepted += self.save_page(&posts).await;
            }
            Err(e) => {
                tracing::warn!(
                    task_id = self.id.0,
                    sort = sort.as_str(),
                    window = window.as_str(),
                    error = %e,
                    "Cascade stage fetch failed, continuing"
                );
            }
        }
    }
}

fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
