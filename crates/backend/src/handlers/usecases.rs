use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use contracts::usecases::u601_run_etl::{EtlRunLogEntry, EtlRunReport, EtlRunRequest};
use contracts::usecases::u602_reset_warehouse::ResetWarehouseResponse;
use serde::Deserialize;
use std::sync::Arc;

use crate::usecases::u601_run_etl::{run_log, EtlExecutor, RunRejected};
use crate::usecases::u602_reset_warehouse;

// ============================================================================
// UseCase u601: Run ETL
// ============================================================================

/// POST /api/u601/etl/run
///
/// Тело необязательно: без него окно календаря берётся из конфигурации.
/// Непустое тело, которое не разбирается как запрос, даёт 400.
pub async fn u601_run_etl(
    State(executor): State<Arc<EtlExecutor>>,
    body: Bytes,
) -> Result<Json<EtlRunReport>, StatusCode> {
    let request = parse_run_request(&body)?;
    match executor.run(request).await {
        Ok(report) => Ok(Json(report)),
        Err(RunRejected::AlreadyRunning) => Err(StatusCode::CONFLICT),
    }
}

fn parse_run_request(body: &[u8]) -> Result<EtlRunRequest, StatusCode> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EtlRunRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Invalid ETL run request: {}", e);
        StatusCode::BAD_REQUEST
    })
}

#[derive(Deserialize)]
pub struct RunsParams {
    pub limit: Option<usize>,
}

/// GET /api/u601/etl/runs?limit=N
pub async fn u601_list_runs(
    State(executor): State<Arc<EtlExecutor>>,
    Query(params): Query<RunsParams>,
) -> Result<Json<Vec<EtlRunLogEntry>>, StatusCode> {
    match run_log::list_recent(executor.context(), params.limit).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            tracing::error!("Failed to list ETL runs: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ============================================================================
// UseCase u602: Reset warehouse
// ============================================================================

/// POST /api/u602/warehouse/reset
pub async fn u602_reset_warehouse(
    State(executor): State<Arc<EtlExecutor>>,
) -> Result<Json<ResetWarehouseResponse>, StatusCode> {
    let _guard = executor
        .try_start()
        .map_err(|_| StatusCode::CONFLICT)?;
    Ok(Json(
        u602_reset_warehouse::executor::reset_warehouse(executor.context()).await,
    ))
}
