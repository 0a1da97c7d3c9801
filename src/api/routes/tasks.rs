//! Task submission and monitoring handlers.

use super::{CreateTaskRequest, CreateTaskResponse};
use crate::api::AppState;
use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

fn error_response(e: Error) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::from(e))).into_response()
}

/// POST /api/v1/tasks - Create and enqueue a harvest task
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created and queued", body = CreateTaskResponse),
        (status = 400, description = "Invalid query or target count", body = crate::error::ApiError),
        (status = 503, description = "Harvester is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Response {
    match state
        .harvester
        .create_task(payload.kind, &payload.query, payload.target_count)
        .await
    {
        Ok(task) => (
            StatusCode::CREATED,
            Json(CreateTaskResponse {
                task_id: task.id,
                collection: task.collection,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/tasks - List all tasks, newest first
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "List of all tasks", body = Vec<crate::types::TaskInfo>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> Response {
    match state.harvester.list_tasks().await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list tasks");
            error_response(e)
        }
    }
}

/// GET /api/v1/tasks/:id - Get single task
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task information", body = crate::types::TaskInfo),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.harvester.get_task(crate::types::TaskId(id)).await {
        Ok(Some(task)) => (StatusCode::OK, Json(task)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("Task {id}"))),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(task_id = id, error = %e, "Failed to get task");
            error_response(e)
        }
    }
}

/// GET /api/v1/tasks/:id/items - List the items in the task's collection
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}/items",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Items gathered into the task's collection, newest first", body = Vec<crate::db::ItemRow>),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_task_items(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let task = match state.harvester.get_task(crate::types::TaskId(id)).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!("Task {id}"))),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(task_id = id, error = %e, "Failed to get task");
            return error_response(e);
        }
    };

    match state.harvester.db.list_items(&task.collection).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => {
            tracing::error!(task_id = id, error = %e, "Failed to list items");
            error_response(e)
        }
    }
}
