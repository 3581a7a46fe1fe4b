//! HTTP surface exercised in-process with `tower::ServiceExt::oneshot`.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use grid_optimizer::{api, config::Config, controller::AppState, ingest};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app(seeded: bool) -> Router {
    let cfg = Config::default();
    let state = AppState::in_memory(cfg.clone());
    if seeded {
        ingest::seed(state.engine.states()).await.unwrap();
    }
    api::router(state, &cfg)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn regions_are_listed_in_catalog_order() {
    let (status, body) = send(app(false).await, get("/api/v1/regions")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["us-west", "us-east", "us-central", "pgae"]);
    assert_eq!(body["metadata"]["total_count"], 4);
}

#[tokio::test]
async fn optimize_returns_record() {
    let (status, body) = send(
        app(true).await,
        post("/api/v1/optimize", json!({ "region": "US-East" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["region"], "us-east");
    let supply = body["data"]["optimized_supply"].as_f64().unwrap();
    assert!((supply - 1510.0).abs() < 1e-6);
}

#[tokio::test]
async fn error_statuses_are_distinct() {
    let (status, body) = send(
        app(false).await,
        post("/api/v1/optimize", json!({ "region": "us-west" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = send(
        app(false).await,
        post("/api/v1/optimize", json!({ "region": "atlantis" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(false).await, get("/api/v1/status/atlantis")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_reports_sample_and_efficiency() {
    let app = app(true).await;
    let (status, _) = send(app.clone(), post("/api/v1/optimize", json!({ "region": "pgae" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, get("/api/v1/status/pgae")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["latest_sample"]["demand"], 1210.0);
    let efficiency = body["data"]["efficiency_percent"].as_f64().unwrap();
    assert!(efficiency > 99.999);
}

#[tokio::test]
async fn history_is_limited() {
    let (status, body) = send(app(true).await, get("/api/v1/history/us-west?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["samples"].as_array().unwrap().len(), 2);
    assert!(body["data"]["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn samples_then_optimize() {
    let app = app(false).await;
    let (status, body) = send(
        app.clone(),
        post(
            "/api/v1/samples",
            json!([
                { "region": "asia", "demand": 500.0, "supply": 520.0, "observed_at": "2024-05-01T00:00:00Z" },
                { "region": "atlantis", "demand": 1.0, "supply": 2.0, "observed_at": "2024-05-01T00:00:00Z" }
            ]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"], json!({ "accepted": 1, "rejected": 1 }));

    let (status, _) = send(
        app.clone(),
        post(
            "/api/v1/samples",
            json!({ "region": "asia", "demand": 1.0, "supply": 2.0, "observed_at": "2024-05-01T00:00:00Z", "efficiency_percent": 140.0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(app, post("/api/v1/optimize", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["region"], "asia");
}

#[tokio::test]
async fn async_task_can_be_polled() {
    let app = app(true).await;
    let (status, body) = send(
        app.clone(),
        post("/api/v1/optimize/async", json!({ "region": "us-central" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let url = body["data"]["status_url"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for _ in 0..50 {
        let (status, body) = send(app.clone(), get(&url)).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
        if last["data"]["status"] != "running" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(last["data"]["status"], "completed");
    assert_eq!(last["data"]["record"]["region"], "us-central");

    let (status, _) = send(app, get("/api/v1/optimize/tasks/00000000-0000-0000-0000-000000000000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ask_routes_text() {
    let (status, body) = send(
        app(true).await,
        post("/api/v1/ask", json!({ "text": "optimize the grid for region us-west" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["intent"], "optimize");
    assert_eq!(body["data"]["region"], "us-west");
    assert_eq!(body["data"]["success"], true);
}

#[tokio::test]
async fn health_is_ok_for_memory_backend() {
    let (status, body) = send(app(false).await, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["storage"]["backend"], "memory");
}

#[tokio::test]
async fn readiness_reports_storage() {
    let (status, body) = send(app(false).await, get("/api/v1/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["storage"]["reachable"], true);
}
