//! Core harvester implementation split into focused submodules.
//!
//! The `Harvester` struct and its methods are organized by domain:
//! - [`queue_processor`] - queue polling and bounded task spawning
//! - [`task_runner`] - per-task lifecycle state machine
//! - [`persist`] - item persistence and progress accounting
//! - [`strategies`] - the keyword / user / community traversals

mod persist;
mod queue_processor;
pub(crate) mod strategies;
mod task_runner;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::credentials::CredentialPool;
use crate::db::{Database, NewTask};
use crate::error::{Error, Result};
use crate::export::ExportLog;
use crate::pacing::RequestPacer;
use crate::types::{Event, HarvestStats, TaskId, TaskInfo, TaskKind, TaskStatus, collection_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Characters rejected in task queries
///
/// They would produce unusable collection names or mangle platform URLs.
const FORBIDDEN_QUERY_CHARS: [char; 5] = ['/', '\\', ' ', '.', '$'];

/// Queue and worker state management
#[derive(Clone)]
pub(crate) struct QueueState {
    /// FIFO queue of task ids waiting for a worker
    pub(crate) queue: Arc<tokio::sync::Mutex<std::collections::VecDeque<TaskId>>>,
    /// Semaphore to limit concurrent tasks (respects max_concurrent_tasks config)
    pub(crate) concurrent_limit: Arc<tokio::sync::Semaphore>,
    /// Number of tasks currently executing
    pub(crate) running: Arc<AtomicUsize>,
    /// Flag to indicate whether new tasks are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main harvester instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Harvester {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to query task status
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Per-credential source clients with random selection
    pub(crate) credentials: CredentialPool,
    /// Shared pacing policy (inter-item delay, error backoff)
    pub(crate) pacer: RequestPacer,
    /// Append-only export log
    pub(crate) export: Arc<ExportLog>,
    /// Items accepted since process start, across all tasks
    pub(crate) total_accepted: Arc<AtomicU64>,
    /// Queue and worker state
    pub(crate) queue_state: QueueState,
}

impl Harvester {
    /// Create a new Harvester instance
    ///
    /// This initializes all core components:
    /// - Opens/creates the SQLite database and runs migrations (fatal on failure)
    /// - Builds one source client per configured credential
    /// - Sets up the event broadcast channel
    /// - Re-enqueues tasks interrupted by the previous shutdown
    pub async fn new(config: Config) -> Result<Self> {
        let credentials = CredentialPool::from_config(&config)?;
        Self::with_credential_pool(config, credentials).await
    }

    /// Create a Harvester over a pre-built credential pool
    ///
    /// Lets embedders (and tests) supply their own [`ContentSource`]
    /// implementations instead of the HTTP client.
    ///
    /// [`ContentSource`]: crate::source::ContentSource
    pub async fn with_credential_pool(config: Config, credentials: CredentialPool) -> Result<Self> {
        // A harvester without a reachable task store is useless: fail fast
        let db = Database::new(&config.persistence.database_path).await?;

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let pacer = RequestPacer::new(&config.harvest);
        let export = Arc::new(ExportLog::new(config.persistence.export_path.clone()));

        let queue_state = QueueState {
            queue: Arc::new(tokio::sync::Mutex::new(std::collections::VecDeque::new())),
            concurrent_limit: Arc::new(tokio::sync::Semaphore::new(
                config.harvest.max_concurrent_tasks,
            )),
            running: Arc::new(AtomicUsize::new(0)),
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        let harvester = Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            credentials,
            pacer,
            export,
            total_accepted: Arc::new(AtomicU64::new(0)),
            queue_state,
        };

        // Re-enqueue work interrupted by the previous shutdown
        harvester.restore_queue().await?;

        Ok(harvester)
    }

    /// Re-enqueue tasks that were pending or running at last shutdown
    async fn restore_queue(&self) -> Result<()> {
        let resumable = self.db.list_resumable_tasks().await?;
        if resumable.is_empty() {
            return Ok(());
        }

        let mut queue = self.queue_state.queue.lock().await;
        for task in resumable {
            let id = TaskId(task.id);
            if task.status == TaskStatus::Running.to_i32() {
                self.db.update_task_status(id, TaskStatus::Pending).await?;
            }
            queue.push_back(id);
        }
        tracing::info!(restored = queue.len(), "Restored interrupted tasks to queue");

        Ok(())
    }

    /// Create a new harvest task and enqueue it
    ///
    /// Validates the submission, persists the task in pending status,
    /// derives its collection name, and hands the id to the worker pool.
    pub async fn create_task(
        &self,
        kind: TaskKind,
        query: &str,
        target_count: u32,
    ) -> Result<TaskInfo> {
        if !self.queue_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        validate_query(query)?;
        if target_count == 0 {
            return Err(Error::InvalidTask(
                "target_count must be greater than zero".to_string(),
            ));
        }
        if target_count > self.config.harvest.max_target_count {
            return Err(Error::InvalidTask(format!(
                "target_count {} exceeds the maximum of {}",
                target_count, self.config.harvest.max_target_count
            )));
        }

        let collection = collection_name(query);
        let new_task = NewTask {
            kind: kind.to_i32(),
            query: query.to_string(),
            target_count: target_count as i64,
            collection: collection.clone(),
        };

        let id = self.db.insert_task(&new_task).await?;

        {
            let mut queue = self.queue_state.queue.lock().await;
            queue.push_back(id);
        }

        tracing::info!(
            task_id = id.0,
            kind = %kind,
            query,
            target_count,
            collection = collection.as_str(),
            "Task created and queued"
        );
        self.emit_event(Event::TaskQueued {
            id,
            kind,
            query: query.to_string(),
        });

        let row = self
            .db
            .get_task(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("task {id}")))?;
        Ok(row.into())
    }

    /// Get one task by id
    pub async fn get_task(&self, id: TaskId) -> Result<Option<TaskInfo>> {
        Ok(self.db.get_task(id).await?.map(Into::into))
    }

    /// List all tasks, newest first
    pub async fn list_tasks(&self) -> Result<Vec<TaskInfo>> {
        Ok(self
            .db
            .list_tasks()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Subscribe to harvest events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently; a subscriber that falls behind by more than
    /// 1000 events receives a `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers (ignores "no subscribers" errors)
    pub(crate) fn emit_event(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    /// Current counters for backpressure visibility
    pub async fn stats(&self) -> HarvestStats {
        let queue_depth = self.queue_state.queue.lock().await.len();
        HarvestStats {
            total_accepted: self.total_accepted.load(Ordering::SeqCst),
            queue_depth,
            running: self.queue_state.running.load(Ordering::SeqCst),
            max_concurrent_tasks: self.config.harvest.max_concurrent_tasks,
        }
    }

    /// Gracefully shut down the harvester
    ///
    /// Stops accepting new tasks, then waits (bounded) for running tasks
    /// to finish. Queued tasks stay pending in the database and are
    /// re-enqueued on the next start.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.queue_state.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new tasks");

        let shutdown_timeout = std::time::Duration::from_secs(30);
        let wait_result =
            tokio::time::timeout(shutdown_timeout, self.wait_for_running_tasks()).await;

        match wait_result {
            Ok(()) => tracing::info!("All running tasks completed gracefully"),
            Err(_) => {
                tracing::warn!("Timeout waiting for tasks to complete, proceeding with shutdown")
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Wait for the running-task counter to reach zero
    async fn wait_for_running_tasks(&self) {
        loop {
            let running = self.queue_state.running.load(Ordering::SeqCst);
            if running == 0 {
                return;
            }
            tracing::debug!(running, "Waiting for running tasks to complete");
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }

    /// Spawn the API server on the configured bind address
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let harvester = Arc::new(self.clone());
        let config = Arc::clone(&self.config);
        tokio::spawn(async move { crate::api::start_api_server(harvester, config).await })
    }
}

/// Validate a task query string
fn validate_query(query: &str) -> Result<()> {
    if query.is_empty() {
        return Err(Error::InvalidTask("query must not be empty".to_string()));
    }
    if let Some(bad) = query.chars().find(|c| FORBIDDEN_QUERY_CHARS.contains(c)) {
        return Err(Error::InvalidTask(format!(
            "query contains forbidden character {bad:?}"
        )));
    }
    Ok(())
}
