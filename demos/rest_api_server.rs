//! REST API server example
//!
//! This example shows how to run post-harvest with the REST API enabled,
//! allowing control via HTTP endpoints.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8642/swagger-ui
//! - Submit tasks via POST http://localhost:8642/api/v1/tasks
//! - Monitor progress via GET http://localhost:8642/api/v1/tasks
//! - Stream events via GET http://localhost:8642/api/v1/events

use post_harvest::config::{ApiConfig, Config, CredentialConfig};
use post_harvest::{Harvester, run_with_shutdown};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Configure a platform credential
    let credential = CredentialConfig {
        client_id: "your_client_id".to_string(),
        client_secret: "your_client_secret".to_string(),
        user_agent: "post-harvest-demo/0.1 by your_handle".to_string(),
    };

    // Configure API
    let api_config = ApiConfig {
        bind_address: "127.0.0.1:8642".parse::<SocketAddr>()?,
        cors_enabled: true,
        cors_origins: vec!["*".to_string()],
        swagger_ui: true,
    };

    // Build configuration
    let config = Config {
        credentials: vec![credential],
        api: api_config,
        ..Default::default()
    };

    // Create harvester instance and start the worker pool
    let harvester = Harvester::new(config).await?;
    harvester.start_queue_processor();

    println!("🚀 Starting post-harvest REST API server");
    println!("📖 Swagger UI: http://localhost:8642/swagger-ui");
    println!("📡 API Base: http://localhost:8642/api/v1");
    println!("🔄 Events stream: http://localhost:8642/api/v1/events");
    println!();
    println!("Example commands:");
    println!("  # Submit a keyword task");
    println!("  curl -X POST http://localhost:8642/api/v1/tasks \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"kind\": \"keyword\", \"query\": \"rust\", \"target_count\": 100}}'");
    println!();
    println!("  # List all tasks");
    println!("  curl http://localhost:8642/api/v1/tasks");
    println!();
    println!("  # Stream events (Server-Sent Events)");
    println!("  curl -N http://localhost:8642/api/v1/events");

    // Serve the API until a termination signal arrives
    let api = harvester.spawn_api_server();
    run_with_shutdown(harvester).await?;
    api.abort();

    Ok(())
}
