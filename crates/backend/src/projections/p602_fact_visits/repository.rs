use chrono::NaiveDateTime;
use contracts::projections::p602_fact_visits::dto::{LoadedVisitKey, VisitFactRecord};
use serde_json::json;
use std::collections::HashMap;

use crate::shared::data::{decode_rows, encode_row, Filter, Row, StoreError};
use crate::shared::etl_context::EtlContext;

/// Уже загруженные визиты: visit_key -> ключ с отметкой выхода
pub async fn loaded_keys(ctx: &EtlContext) -> Result<HashMap<String, LoadedVisitKey>, StoreError> {
    let rows = ctx
        .warehouse
        .read(&ctx.tables.fact_visits, &Filter::all())
        .await?;

    Ok(decode_rows::<LoadedVisitKey>(&ctx.tables.fact_visits, rows)
        .items
        .into_iter()
        .map(|k| (k.visit_key.clone(), k))
        .collect())
}

pub async fn insert_fact(ctx: &EtlContext, record: &VisitFactRecord) -> Result<(), StoreError> {
    let row = encode_row(record)?;
    ctx.warehouse.insert(&ctx.tables.fact_visits, row).await
}

/// Проставить выход и длительность ранее открытому визиту
pub async fn complete_visit(
    ctx: &EtlContext,
    visit_key: &str,
    check_out_time: NaiveDateTime,
    duration_minutes: i64,
) -> Result<(), StoreError> {
    let mut patch = Row::new();
    patch.insert("check_out_time".to_string(), serde_json::to_value(check_out_time)?);
    patch.insert("duration_minutes".to_string(), json!(duration_minutes));

    ctx.warehouse
        .update(
            &ctx.tables.fact_visits,
            &Filter::all().eq("visit_key", visit_key),
            patch,
        )
        .await
}
