use super::run_log;
use contracts::usecases::u601_run_etl::{
    EtlRunReport, EtlRunRequest, LoadStats, LoaderOutcome, RunStatus,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::projections::{p600_dim_member, p601_dim_date, p602_fact_visits, p603_fact_revenue};
use crate::shared::etl_context::EtlContext;
use crate::shared::etl_error::EtlError;

#[derive(Debug, Error)]
pub enum RunRejected {
    #[error("ETL run or warehouse reset is already in progress")]
    AlreadyRunning,
}

/// Сбрасывает флаг прогона при выходе, в том числе по панике
pub struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Executor для UseCase запуска ETL
///
/// Загрузчики идут строго по порядку: измерение членов, календарь, визиты,
/// выручка (факты ссылаются на суррогатные ключи измерения). Падение одного
/// загрузчика не останавливает остальные. Одновременно допускается один прогон.
pub struct EtlExecutor {
    ctx: Arc<EtlContext>,
    running: AtomicBool,
}

impl EtlExecutor {
    pub fn new(ctx: Arc<EtlContext>) -> Self {
        Self {
            ctx,
            running: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &EtlContext {
        &self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Занять исполнитель. Прогон и сброс хранилища берут один и тот же
    /// флаг, поэтому не пересекаются; флаг освобождается с guard.
    pub fn try_start(&self) -> Result<RunningGuard<'_>, RunRejected> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Rejected: an ETL run or warehouse reset is in progress");
            return Err(RunRejected::AlreadyRunning);
        }
        Ok(RunningGuard(&self.running))
    }

    /// Выполнить полный прогон
    pub async fn run(&self, request: EtlRunRequest) -> Result<EtlRunReport, RunRejected> {
        let _guard = self.try_start()?;
        Ok(run_all(&self.ctx, &request).await)
    }
}

fn outcome(table: &str, result: Result<LoadStats, EtlError>) -> LoaderOutcome {
    match result {
        Ok(stats) => LoaderOutcome {
            table: table.to_string(),
            stats,
            error: None,
        },
        Err(e) => {
            tracing::error!("Loader for {} failed: {}", table, e);
            LoaderOutcome {
                table: table.to_string(),
                stats: LoadStats::default(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Прогнать четыре загрузчика и записать отчёт в журнал
pub async fn run_all(ctx: &EtlContext, request: &EtlRunRequest) -> EtlRunReport {
    let run_id = Uuid::new_v4().to_string();
    let started_at = ctx.clock.now();
    let days_back = request.days_back.unwrap_or(ctx.settings.days_back);
    let days_forward = request.days_forward.unwrap_or(ctx.settings.days_forward);

    tracing::info!(
        "ETL run {} started (operational: {}, warehouse: {})",
        run_id,
        ctx.operational.backend_name(),
        ctx.warehouse.backend_name()
    );

    let mut outcomes = Vec::with_capacity(4);
    outcomes.push(outcome(
        &ctx.tables.dim_member,
        p600_dim_member::service::load(ctx).await,
    ));
    outcomes.push(outcome(
        &ctx.tables.dim_date,
        p601_dim_date::service::load(ctx, days_back, days_forward).await,
    ));
    outcomes.push(outcome(
        &ctx.tables.fact_visits,
        p602_fact_visits::service::load(ctx).await,
    ));
    outcomes.push(outcome(
        &ctx.tables.fact_revenue,
        p603_fact_revenue::service::load(ctx).await,
    ));

    let tables: BTreeMap<String, usize> = outcomes
        .iter()
        .map(|o| (o.table.clone(), o.stats.inserted))
        .collect();

    let status = if outcomes
        .iter()
        .any(|o| o.error.is_some() || o.stats.has_problems())
    {
        RunStatus::CompletedWithErrors
    } else {
        RunStatus::Completed
    };

    let report = EtlRunReport {
        run_id,
        started_at,
        finished_at: ctx.clock.now(),
        status,
        tables,
        outcomes,
    };

    tracing::info!(
        "ETL run {} finished: {} ({} new rows)",
        report.run_id,
        report.status.code(),
        report.total_written()
    );

    if let Err(e) = run_log::append(ctx, &report).await {
        tracing::warn!("Failed to write run {} to {}: {}", report.run_id, ctx.tables.etl_run_log, e);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::memory_store::StoreOp;
    use crate::shared::test_support::{day, memory_ctx};
    use serde_json::json;

    fn seed_operational(store: &crate::shared::data::memory_store::MemoryTableStore) {
        store.seed(
            "members",
            vec![
                json!({"id": 1, "first_name": "Eszter", "last_name": "Molnár", "status": "ACTIVE",
                       "birth_date": "1990-05-05", "join_date": "2024-01-10"}),
                json!({"id": 2, "first_name": "Gábor", "last_name": "Balogh", "status": "INACTIVE"}),
            ],
        );
        store.seed(
            "check_ins",
            vec![json!({"id": 100, "member_id": 1,
                        "check_in_time": "2026-10-17T09:00:00", "check_out_time": "2026-10-17T09:45:00"})],
        );
        store.seed(
            "payments",
            vec![json!({"id": 200, "member_id": 2, "amount": 12000, "payment_date": "2026-10-16"})],
        );
    }

    #[tokio::test]
    async fn test_full_run_reports_new_rows_per_table() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));
        seed_operational(&store);

        let report = run_all(&ctx, &EtlRunRequest { days_back: Some(6), days_forward: Some(0) }).await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.tables.get("dim_member"), Some(&2));
        assert_eq!(report.tables.get("dim_date"), Some(&7));
        assert_eq!(report.tables.get("fact_visits"), Some(&1));
        assert_eq!(report.tables.get("fact_revenue"), Some(&1));

        let order: Vec<&str> = report.outcomes.iter().map(|o| o.table.as_str()).collect();
        assert_eq!(order, vec!["dim_member", "dim_date", "fact_visits", "fact_revenue"]);

        let again = run_all(&ctx, &EtlRunRequest { days_back: Some(6), days_forward: Some(0) }).await;
        assert_eq!(again.total_written(), 0);
        assert_eq!(again.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_loader_reports_zero_and_others_run() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));
        seed_operational(&store);
        store.fail_on(StoreOp::Read, "check_ins");

        let report = run_all(&ctx, &EtlRunRequest::default()).await;

        assert_eq!(report.status, RunStatus::CompletedWithErrors);
        assert_eq!(report.tables.get("fact_visits"), Some(&0));
        assert_eq!(report.tables.get("fact_revenue"), Some(&1));
        assert_eq!(report.tables.get("dim_date"), Some(&546));
        let visits = &report.outcomes[2];
        assert!(visits.error.as_deref().unwrap().contains("check_ins"));
    }

    #[tokio::test]
    async fn test_run_is_logged() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));
        seed_operational(&store);

        let report = run_all(&ctx, &EtlRunRequest::default()).await;
        let entries = run_log::list_recent(&ctx, None).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].run_id, report.run_id);
        assert_eq!(entries[0].status, "completed");
        let summary: EtlRunReport = serde_json::from_str(&entries[0].summary).unwrap();
        assert_eq!(summary, report);
    }

    #[tokio::test]
    async fn test_run_log_failure_does_not_fail_run() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));
        seed_operational(&store);
        store.fail_on(StoreOp::Insert, "etl_run_log");

        let report = run_all(&ctx, &EtlRunRequest::default()).await;
        assert_eq!(report.status, RunStatus::Completed);
        assert!(store.rows("etl_run_log").is_empty());
    }

    #[tokio::test]
    async fn test_two_runs_on_sqlite() {
        use crate::shared::clock::FixedClock;
        use crate::shared::config::{EtlSettings, TablesConfig};
        use crate::shared::data::sqlite_store::SqliteTableStore;
        use crate::shared::data::{Filter, Row};
        use crate::shared::test_support::at;

        fn row(v: serde_json::Value) -> Row {
            v.as_object().cloned().unwrap()
        }

        let tables = TablesConfig::default();
        let store = Arc::new(SqliteTableStore::in_memory(&tables).await.unwrap());
        let ctx = EtlContext::new(
            store.clone(),
            tables,
            EtlSettings::default(),
            Arc::new(FixedClock::on(day(2026, 10, 10))),
        );
        let seeds = [
            ("members", json!({"member_id": 1, "first_name": "Eszter", "last_name": "Molnár",
                               "status": "ACTIVE", "birth_date": "1990-05-05", "join_date": "2024-01-10"})),
            ("members", json!({"member_id": 2, "first_name": "Gábor", "last_name": "Balogh", "status": "ACTIVE"})),
            ("check_ins", json!({"check_in_id": 100, "member_id": 1,
                                 "check_in_time": "2026-10-10T09:00:00", "check_out_time": "2026-10-10T09:45:00"})),
            ("payments", json!({"payment_id": 200, "member_id": 2, "amount": 12000.0,
                                "payment_type": "CARD", "payment_date": "2026-10-09T16:00:00"})),
        ];
        for (table, value) in seeds {
            ctx.operational.insert(table, row(value)).await.unwrap();
        }
        let request = EtlRunRequest {
            days_back: Some(6),
            days_forward: Some(0),
        };

        let first = run_all(&ctx, &request).await;
        assert_eq!(first.status, RunStatus::Completed);
        assert_eq!(first.tables.get("dim_member"), Some(&2));
        assert_eq!(first.tables.get("dim_date"), Some(&7));
        assert_eq!(first.tables.get("fact_visits"), Some(&1));
        assert_eq!(first.tables.get("fact_revenue"), Some(&1));

        ctx.operational
            .update(
                "members",
                &Filter::all().eq("member_id", 2),
                row(json!({"status": "INACTIVE"})),
            )
            .await
            .unwrap();

        let second = run_all(&at(&ctx, day(2026, 10, 17)), &request).await;
        assert_eq!(second.status, RunStatus::Completed);
        assert_eq!(second.tables.get("dim_member"), Some(&1));
        assert_eq!(second.tables.get("dim_date"), Some(&7));
        assert_eq!(second.tables.get("fact_visits"), Some(&0));
        assert_eq!(second.tables.get("fact_revenue"), Some(&0));

        let versions = ctx
            .warehouse
            .read("dim_member", &Filter::all().eq("member_id", 2).order_by("member_key"))
            .await
            .unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0]["is_current"], json!(false));
        assert_eq!(versions[0]["valid_to"], json!("2026-10-17"));
        assert_eq!(versions[1]["is_current"], json!(true));
        assert_eq!(versions[1]["member_status"], json!("INACTIVE"));

        assert_eq!(run_log::list_recent(&ctx, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_executor_rejects_concurrent_run() {
        let (_store, ctx) = memory_ctx(day(2026, 10, 17));
        let executor = EtlExecutor::new(Arc::new(ctx));

        executor.running.store(true, Ordering::Release);
        assert!(matches!(
            executor.run(EtlRunRequest::default()).await,
            Err(RunRejected::AlreadyRunning)
        ));

        executor.running.store(false, Ordering::Release);
        assert!(executor.run(EtlRunRequest::default()).await.is_ok());
        assert!(!executor.is_running());
    }

    #[tokio::test]
    async fn test_held_guard_blocks_run_until_dropped() {
        let (_store, ctx) = memory_ctx(day(2026, 10, 17));
        let executor = EtlExecutor::new(Arc::new(ctx));

        let guard = executor.try_start().unwrap();
        assert!(executor.is_running());
        assert!(executor.try_start().is_err());
        assert!(matches!(
            executor.run(EtlRunRequest::default()).await,
            Err(RunRejected::AlreadyRunning)
        ));

        drop(guard);
        assert!(!executor.is_running());
        assert!(executor.run(EtlRunRequest::default()).await.is_ok());
    }
}
