//! REST API server module
//!
//! Provides an OpenAPI compliant REST API for submitting harvest tasks
//! and monitoring their progress.

use crate::config::Config;
use crate::error::Result;
use crate::harvester::Harvester;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa_swagger_ui::SwaggerUi;

pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// All routes are served under the `/api/v1` prefix, matching the
/// OpenAPI document.
///
/// # Routes
///
/// ## Tasks
/// - `POST /api/v1/tasks` - Create and enqueue a harvest task
/// - `GET /api/v1/tasks` - List all tasks
/// - `GET /api/v1/tasks/:id` - Get single task
/// - `GET /api/v1/tasks/:id/items` - List the items a task's collection holds
///
/// ## System
/// - `GET /api/v1/stats` - Harvester counters
/// - `GET /api/v1/health` - Health check
/// - `GET /api/v1/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /api/v1/events` - Server-sent events stream
pub fn create_router(harvester: Arc<Harvester>, config: Arc<Config>) -> Router {
    let state = AppState::new(harvester, config.clone());

    let api_routes = Router::new()
        // Tasks
        .route("/tasks", post(routes::create_task))
        .route("/tasks", get(routes::list_tasks))
        .route("/tasks/:id", get(routes::get_task))
        .route("/tasks/:id/items", get(routes::list_task_items))
        // System
        .route("/stats", get(routes::harvest_stats))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    let router = Router::new().nest("/api/v1", api_routes);

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The spec itself is served by the openapi_spec handler; the UI is
    // pointed at that route instead of registering its own copy.
    let router = if config.api.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui")
                .config(utoipa_swagger_ui::Config::from("/api/v1/openapi.json")),
        )
    } else {
        router
    };

    let router = router.with_state(state);

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Supports "*" for any origin; otherwise only the listed origins are
/// allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Binds a TCP listener and serves the router until the task is aborted
/// or the listener fails.
pub async fn start_api_server(harvester: Arc<Harvester>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(harvester, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
