//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the post-harvest REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the post-harvest REST API
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "post-harvest REST API",
        version = "0.1.0",
        description = "REST API for submitting harvest tasks and monitoring their progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8642/api/v1", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::create_task,
        crate::api::routes::list_tasks,
        crate::api::routes::get_task,
        crate::api::routes::list_task_items,

        // System
        crate::api::routes::harvest_stats,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::TaskKind,
        crate::types::TaskInfo,
        crate::types::Post,
        crate::types::HarvestStats,
        crate::types::Event,

        // Storage rows exposed through /tasks/:id/items
        crate::db::ItemRow,

        // API request/response types
        crate::api::routes::CreateTaskRequest,
        crate::api::routes::CreateTaskResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Harvest tasks - Submit tasks and monitor their progress and items"),
        (name = "system", description = "System endpoints - Stats, health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
