//! Grid optimization endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    command::CommandReply,
    controller::{AppState, JobInfo},
    domain::{GridSample, OptimizationRecord, RegionInfo},
    error::GridError,
    repo::IngestReport,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// GET /api/v1/regions
pub async fn list_regions(State(state): State<AppState>) -> ApiResult<Vec<RegionInfo>> {
    let regions = state.regions.list_regions().to_vec();
    let count = regions.len();
    Ok(Json(ApiResponse::success(regions).with_count(count)))
}

#[derive(Debug, Default, Deserialize)]
pub struct OptimizeRequest {
    /// Omitted means the most recent sample of any region.
    #[serde(default)]
    pub region: Option<String>,
}

/// POST /api/v1/optimize
pub async fn optimize(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> ApiResult<OptimizationRecord> {
    let start = Instant::now();
    let record = state.engine.optimize(req.region.as_deref()).await?;
    Ok(Json(
        ApiResponse::success(record).with_duration(start.elapsed().as_millis() as u64),
    ))
}

#[derive(Debug, Serialize)]
pub struct TaskAccepted {
    pub task_id: Uuid,
    pub status_url: String,
}

/// POST /api/v1/optimize/async
pub async fn optimize_async(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TaskAccepted>>), ApiError> {
    let region = req
        .region
        .as_deref()
        .map(|r| state.access.admit(r))
        .transpose()?;
    let handle = state.dispatcher.submit(region);
    let accepted = TaskAccepted {
        task_id: handle.task_id,
        status_url: format!("/api/v1/optimize/tasks/{}", handle.task_id),
    };
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(accepted))))
}

/// GET /api/v1/optimize/tasks/:id
pub async fn task_status(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> ApiResult<JobInfo> {
    state
        .dispatcher
        .status(&task_id)
        .map(|info| Json(ApiResponse::success(info)))
        .ok_or_else(|| ApiError::Missing(format!("task {}", task_id)))
}

#[derive(Debug, Serialize)]
pub struct RegionStatus {
    pub region: String,
    pub latest_sample: Option<GridSample>,
    pub last_optimization: Option<OptimizationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency_percent: Option<f64>,
}

/// GET /api/v1/status/:region
pub async fn region_status(State(state): State<AppState>, Path(region): Path<String>) -> ApiResult<RegionStatus> {
    let region = state.access.admit(&region)?;
    let latest_sample = optional(state.engine.states().latest(Some(&region)).await)?;
    let last_optimization = optional(state.engine.latest_result(Some(&region)).await)?;
    if latest_sample.is_none() && last_optimization.is_none() {
        return Err(GridError::no_data(Some(&region)).into());
    }
    let efficiency_percent = last_optimization
        .as_ref()
        .and_then(OptimizationRecord::efficiency_percent);
    Ok(Json(ApiResponse::success(RegionStatus {
        region,
        latest_sample,
        last_optimization,
        efficiency_percent,
    })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RegionHistory {
    pub region: String,
    pub samples: Vec<GridSample>,
    pub results: Vec<OptimizationRecord>,
}

/// GET /api/v1/history/:region?limit=
pub async fn region_history(
    State(state): State<AppState>,
    Path(region): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<RegionHistory> {
    let region = state.access.admit(&region)?;
    let limit = q.limit.unwrap_or(state.cfg.grid.history_limit);
    let samples = state.engine.states().history(Some(&region), limit).await?;
    let results = state.engine.results().history(Some(&region), limit).await?;
    let count = samples.len() + results.len();
    Ok(Json(
        ApiResponse::success(RegionHistory {
            region,
            samples,
            results,
        })
        .with_count(count),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SamplesBody {
    One(GridSample),
    Many(Vec<GridSample>),
}

/// POST /api/v1/samples
///
/// A single sample is rejected outright when invalid; a batch skips invalid
/// rows and reports how many were accepted.
pub async fn ingest_samples(
    State(state): State<AppState>,
    Json(body): Json<SamplesBody>,
) -> Result<(StatusCode, Json<ApiResponse<IngestReport>>), ApiError> {
    let report = match body {
        SamplesBody::One(sample) => {
            state.engine.states().record(sample).await?;
            IngestReport {
                accepted: 1,
                rejected: 0,
            }
        }
        SamplesBody::Many(samples) => state.engine.states().record_batch(samples).await?,
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::success(report))))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub text: String,
}

/// POST /api/v1/ask
pub async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> ApiResult<CommandReply> {
    let reply = state.commands.execute(&req.text).await;
    Ok(Json(ApiResponse::success(reply)))
}

fn optional<T>(result: Result<T, GridError>) -> Result<Option<T>, GridError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_no_data() => Ok(None),
        Err(e) => Err(e),
    }
}
