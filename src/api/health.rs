use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use crate::config::StorageBackend;
use crate::controller::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    version: &'static str,
    checked_at: DateTime<Utc>,
    checks: Checks,
}

#[derive(Debug, Serialize)]
pub struct Checks {
    storage: StorageProbe,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StorageProbe {
    backend: StorageBackend,
    reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl StorageProbe {
    async fn run(state: &AppState) -> Self {
        let backend = state.cfg.db.backend;
        let started = Instant::now();
        match state.engine.states().ping().await {
            Ok(()) => Self {
                backend,
                reachable: true,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => Self {
                backend,
                reachable: false,
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// GET /api/v1/health
///
/// 503 with `"degraded"` when the storage backend does not answer.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    let storage = StorageProbe::run(&state).await;
    let (code, status) = if storage.reachable {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    tracing::debug!(status, backend = ?storage.backend, "health probed");
    let body = Health {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checked_at: Utc::now(),
        checks: Checks { storage },
    };
    (code, Json(body))
}

/// GET /api/v1/health/live
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    ready: bool,
    storage: StorageProbe,
}

/// GET /api/v1/health/ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let storage = StorageProbe::run(&state).await;
    let code = if storage.reachable {
        StatusCode::OK
    } else {
        tracing::warn!(error = ?storage.error, "not ready, storage unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = Readiness {
        ready: storage.reachable,
        storage,
    };
    (code, Json(body))
}
