//! Queue processing loop for the harvester.

use super::Harvester;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// How often the processor polls the queue when idle
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl Harvester {
    /// Start the background queue processor
    ///
    /// Polls the queue and spawns a worker per task, bounded by the
    /// concurrency semaphore. Runs until the harvester is dropped.
    pub fn start_queue_processor(&self) -> tokio::task::JoinHandle<()> {
        let harvester = self.clone();

        tokio::spawn(async move {
            tracing::info!(
                max_concurrent = harvester.config.harvest.max_concurrent_tasks,
                "Queue processor started"
            );

            loop {
                let next = {
                    let mut queue = harvester.queue_state.queue.lock().await;
                    queue.pop_front()
                };

                let Some(task_id) = next else {
                    tokio::time::sleep(QUEUE_POLL_INTERVAL).await;
                    continue;
                };

                // Block here until a worker slot frees up
                let permit = match harvester
                    .queue_state
                    .concurrent_limit
                    .clone()
                    .acquire_owned()
                    .await
                {
                    Ok(permit) => permit,
                    Err(_) => {
                        // Semaphore closed: push the task back and stop
                        let mut queue = harvester.queue_state.queue.lock().await;
                        queue.push_front(task_id);
                        tracing::warn!("Concurrency semaphore closed, queue processor stopping");
                        break;
                    }
                };

                harvester.queue_state.running.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(task_id = task_id.0, "Dispatching task to worker");

                let worker = harvester.clone();
                tokio::spawn(async move {
                    worker.run_task(task_id).await;
                    worker.queue_state.running.fetch_sub(1, Ordering::SeqCst);
                    drop(permit);
                });
            }
        })
    }
}
