use super::*;
use crate::harvester::test_helpers::{TestHarness, create_test_harvester, create_test_harvester_with};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;


/// Build a router over a scripted harvester
async fn test_app() -> (Router, TestHarness) {
    let harness = create_test_harvester().await;
    let config = harness.harvester.config.clone();
    let app = create_router(Arc::new(harness.harvester.clone()), config);
    (app, harness)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _harness) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_headers_present_when_enabled() {
    let (app, _harness) = test_app().await;

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let (app, _harness) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(json["info"]["title"], "post-harvest REST API");

    let paths = json["paths"].as_object().unwrap();
    for expected in [
        "/api/v1/tasks",
        "/api/v1/tasks/{id}",
        "/api/v1/tasks/{id}/items",
        "/api/v1/stats",
        "/api/v1/health",
    ] {
        assert!(paths.contains_key(expected), "missing path {expected}");
    }
}

#[tokio::test]
async fn test_routes_are_served_where_the_openapi_doc_says() {
    let (app, _harness) = test_app().await;

    // The doc advertises /api/v1 paths; the bare paths must not resolve
    for (documented, bare) in [
        ("/api/v1/health", "/health"),
        ("/api/v1/stats", "/stats"),
        ("/api/v1/tasks", "/tasks"),
        ("/api/v1/openapi.json", "/openapi.json"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(documented)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "expected 200 at {documented}");

        let response = app
            .clone()
            .oneshot(Request::builder().uri(bare).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::NOT_FOUND,
            "{bare} must only exist under the /api/v1 prefix"
        );
    }
}

#[tokio::test]
async fn test_swagger_ui_enabled_by_default() {
    let (app, _harness) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let harness = create_test_harvester_with(|config| {
        config.api.swagger_ui = false;
    })
    .await;
    let config = harness.harvester.config.clone();
    let app = create_router(Arc::new(harness.harvester.clone()), config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}

#[tokio::test]
async fn test_stats_endpoint_reports_queue_depth() {
    let (app, harness) = test_app().await;

    harness
        .harvester
        .create_task(crate::types::TaskKind::Keyword, "rust", 5)
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["queue_depth"], 1);
    assert_eq!(body["running"], 0);
    assert_eq!(body["max_concurrent_tasks"], 4);
    assert_eq!(body["total_accepted"], 0);
}

#[tokio::test]
async fn test_api_server_spawns() {
    let harness = create_test_harvester_with(|config| {
        // Port 0 = OS assigns a free port
        config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    })
    .await;

    let api_handle = harness.harvester.spawn_api_server();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    api_handle.abort();
}
