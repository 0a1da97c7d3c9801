//! # post-harvest
//!
//! Embeddable backend library for harvesting posts from a content
//! platform.
//!
//! ## Design Philosophy
//!
//! post-harvest is designed to be:
//! - **Task-driven** - Submit a task, poll its progress, collect its items
//! - **Polite by default** - Randomized inter-item delays and fixed error
//!   backoff keep traffic under the platform's abuse thresholds
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Durable** - Tasks and items live in SQLite; interrupted work
//!   resumes on the next start
//!
//! ## Quick Start
//!
//! ```no_run
//! use post_harvest::{Config, CredentialConfig, Harvester, TaskKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         credentials: vec![CredentialConfig {
//!             client_id: "app-id".to_string(),
//!             client_secret: "app-secret".to_string(),
//!             user_agent: "my-harvester/0.1".to_string(),
//!         }],
//!         ..Default::default()
//!     };
//!
//!     let harvester = Harvester::new(config).await?;
//!     harvester.start_queue_processor();
//!
//!     let task = harvester.create_task(TaskKind::Keyword, "rust", 100).await?;
//!     println!("queued task {} into {}", task.id, task.collection);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Credential pool with random selection
pub mod credentials;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Append-only export log
pub mod export;
/// Core harvester implementation (decomposed into focused submodules)
pub mod harvester;
/// Request pacing (inter-item delay, error backoff)
pub mod pacing;
/// Retry classification and budgeted retries
pub mod retry;
/// Content platform access
pub mod source;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{
    ApiConfig, Config, CredentialConfig, HarvestConfig, PersistenceConfig, SourceConfig,
};
pub use credentials::CredentialPool;
pub use db::{Database, UpsertOutcome};
pub use error::{
    ApiError, DatabaseError, Error, ErrorDetail, FetchError, Result, ToHttpStatus,
};
pub use export::ExportLog;
pub use harvester::Harvester;
pub use pacing::RequestPacer;
pub use retry::IsRetryable;
pub use source::{ContentSource, FeedPage, HttpSource};
pub use types::{
    Event, HarvestStats, Post, SortOrder, TaskId, TaskInfo, TaskKind, TaskStatus, TimeWindow,
};

/// Helper function to run the harvester with graceful signal handling.
///
/// Waits for a termination signal and then calls the harvester's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use post_harvest::{Config, Harvester, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let harvester = Harvester::new(config).await?;
///     harvester.start_queue_processor();
///
///     // Run with automatic signal handling
///     run_with_shutdown(harvester).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(harvester: Harvester) -> Result<()> {
    wait_for_signal().await;
    harvester.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
