use axum::{extract::State, Json};
use contracts::dashboards::d600_daily_stats::dto::DailyStats;
use std::sync::Arc;

use crate::dashboards::d600_daily_stats::service;
use crate::usecases::u601_run_etl::EtlExecutor;

/// GET /api/d600/daily-stats
pub async fn get_daily_stats(State(executor): State<Arc<EtlExecutor>>) -> Json<DailyStats> {
    Json(service::get_daily_stats(executor.context()).await)
}
