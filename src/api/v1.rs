use axum::{
    routing::{get, post},
    Router,
};

use crate::api::{grid, health};
use crate::controller::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/regions", get(grid::list_regions))
        .route("/optimize", post(grid::optimize))
        .route("/optimize/async", post(grid::optimize_async))
        .route("/optimize/tasks/:id", get(grid::task_status))
        .route("/status/:region", get(grid::region_status))
        .route("/history/:region", get(grid::region_history))
        .route("/samples", post(grid::ingest_samples))
        .route("/ask", post(grid::ask))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .with_state(state)
}
