use contracts::usecases::u601_run_etl::{EtlRunLogEntry, EtlRunReport};

use crate::shared::data::{decode_rows, encode_row, Filter, StoreError};
use crate::shared::etl_context::EtlContext;

pub const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 500;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn entry_from_report(report: &EtlRunReport) -> Result<EtlRunLogEntry, StoreError> {
    Ok(EtlRunLogEntry {
        run_id: report.run_id.clone(),
        started_at: report.started_at.format(TIMESTAMP_FORMAT).to_string(),
        finished_at: report.finished_at.format(TIMESTAMP_FORMAT).to_string(),
        status: report.status.code().to_string(),
        summary: serde_json::to_string(report)?,
    })
}

/// Записать отчёт прогона в `etl_run_log`
pub async fn append(ctx: &EtlContext, report: &EtlRunReport) -> Result<(), StoreError> {
    let row = encode_row(&entry_from_report(report)?)?;
    ctx.warehouse.insert(&ctx.tables.etl_run_log, row).await
}

/// Последние прогоны, новые первыми
pub async fn list_recent(ctx: &EtlContext, limit: Option<usize>) -> Result<Vec<EtlRunLogEntry>, StoreError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let rows = ctx
        .warehouse
        .read(&ctx.tables.etl_run_log, &Filter::all().order_by("started_at"))
        .await?;

    let mut entries = decode_rows::<EtlRunLogEntry>(&ctx.tables.etl_run_log, rows).items;
    entries.reverse();
    entries.truncate(limit);
    Ok(entries)
}
