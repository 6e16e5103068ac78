use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::usecases::u601_run_etl::EtlExecutor;

/// Конфигурация всех роутов приложения
pub fn configure_routes(executor: Arc<EtlExecutor>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // UseCase u601: Run ETL
        .route("/api/u601/etl/run", post(handlers::usecases::u601_run_etl))
        .route("/api/u601/etl/runs", get(handlers::usecases::u601_list_runs))
        // UseCase u602: Reset warehouse
        .route(
            "/api/u602/warehouse/reset",
            post(handlers::usecases::u602_reset_warehouse),
        )
        // D600 Daily stats
        .route(
            "/api/d600/daily-stats",
            get(handlers::d600_daily_stats::get_daily_stats),
        )
        .with_state(executor)
}
