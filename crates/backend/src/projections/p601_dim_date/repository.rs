use contracts::projections::p601_dim_date::dto::DateDimensionRecord;
use serde_json::Value;
use std::collections::HashSet;

use crate::shared::data::{encode_row, Filter, StoreError};
use crate::shared::etl_context::EtlContext;

/// Ключи уже загруженных дней
pub async fn existing_keys(ctx: &EtlContext) -> Result<HashSet<i32>, StoreError> {
    let rows = ctx
        .warehouse
        .read(&ctx.tables.dim_date, &Filter::all())
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| match row.get("date_key") {
            Some(Value::Number(n)) => n.as_i64().and_then(|k| i32::try_from(k).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
        .collect())
}

pub async fn insert_day(ctx: &EtlContext, record: &DateDimensionRecord) -> Result<(), StoreError> {
    let row = encode_row(record)?;
    ctx.warehouse.insert(&ctx.tables.dim_date, row).await
}
