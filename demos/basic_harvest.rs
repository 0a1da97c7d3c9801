//! Basic harvest example
//!
//! This example demonstrates the core functionality of post-harvest:
//! - Configuring platform credentials
//! - Creating a harvester instance
//! - Subscribing to events
//! - Submitting a harvest task
//! - Polling it to completion

use post_harvest::config::{Config, CredentialConfig, HarvestConfig};
use post_harvest::{Event, Harvester, TaskKind};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Configure a platform credential
    let credential = CredentialConfig {
        client_id: "your_client_id".to_string(),
        client_secret: "your_client_secret".to_string(),
        user_agent: "post-harvest-demo/0.1 by your_handle".to_string(),
    };

    // Build configuration
    let config = Config {
        credentials: vec![credential],
        harvest: HarvestConfig {
            max_concurrent_tasks: 2,
            ..Default::default()
        },
        ..Default::default()
    };

    // Create harvester instance
    let harvester = Harvester::new(config).await?;

    // Subscribe to events
    let mut events = harvester.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::TaskQueued { id, kind, query } => {
                    println!("✓ Queued task #{id}: {kind} '{query}'");
                }
                Event::TaskStarted { id } => {
                    println!("▶ Task #{id} started");
                }
                Event::ItemAccepted {
                    id,
                    current_count,
                    progress,
                } => {
                    println!("⬇ Task #{id}: {current_count} items ({progress:.1}%)");
                }
                Event::TaskCompleted { id, current_count } => {
                    println!("✓ Task #{id} complete with {current_count} items");
                }
                Event::TaskFailed { id, error } => {
                    println!("✗ Task #{id} failed: {error}");
                }
            }
        }
    });

    // Start the worker pool
    harvester.start_queue_processor();

    // Submit a keyword task for 100 posts
    let task = harvester.create_task(TaskKind::Keyword, "rust", 100).await?;
    println!("Harvesting into collection {}", task.collection);

    // Poll until the task reaches a terminal state
    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let Some(task) = harvester.get_task(task.id).await? else {
            break;
        };
        if task.status.is_terminal() {
            println!(
                "Task finished as {:?} with {}/{} items",
                task.status, task.current_count, task.target_count
            );
            break;
        }
    }

    harvester.shutdown().await?;
    Ok(())
}
