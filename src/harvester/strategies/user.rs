//! User submission feed traversal.

use super::StrategyContext;
use crate::error::{Error, Result};

impl StrategyContext<'_> {
    /// Single reverse-chronological pass over the user's submissions
    ///
    /// An error on the very first fetch fails the task (the handle most
    /// likely does not exist). Any later error gets one backoff sleep and
    /// then ends the pass with partial results, the same way feed
    /// exhaustion does.
    pub(crate) async fn run_user(&mut self) -> Result<()> {
        let mut cursor: Option<String> = None;
        let mut first_fetch = true;

        while !self.done() {
            let limit = self.batch_size().min(self.remaining());
            let page = match self
                .source()
                .user_feed(&self.query, cursor.as_deref(), limit)
                .await
            {
                Ok(page) => page,
                Err(e) if first_fetch => {
                    return Err(Error::Task(format!(
                        "could not fetch submissions for '{}': {e}",
                        self.query
                    )));
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = self.id.0,
                        accepted = self.accepted(),
                        error = %e,
                        "User feed fetch failed mid-pass, ending with partial results"
                    );
                    self.backoff().await;
                    break;
                }
            };
            first_fetch = false;

            self.save_page(&page.posts).await;

            if page.posts.is_empty() || page.after.is_none() {
                tracing::info!(
                    task_id = self.id.0,
                    accepted = self.accepted(),
                    "User feed exhausted"
                );
                break;
            }
            cursor = page.after;
        }

        Ok(())
    }
}
