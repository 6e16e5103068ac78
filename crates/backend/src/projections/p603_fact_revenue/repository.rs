use contracts::projections::p603_fact_revenue::dto::{LoadedRevenueKey, RevenueFactRecord};
use std::collections::HashSet;

use crate::shared::data::{decode_rows, encode_row, Filter, StoreError};
use crate::shared::etl_context::EtlContext;

pub async fn loaded_keys(ctx: &EtlContext) -> Result<HashSet<String>, StoreError> {
    let rows = ctx
        .warehouse
        .read(&ctx.tables.fact_revenue, &Filter::all())
        .await?;

    Ok(decode_rows::<LoadedRevenueKey>(&ctx.tables.fact_revenue, rows)
        .items
        .into_iter()
        .map(|k| k.revenue_key)
        .collect())
}

pub async fn insert_fact(ctx: &EtlContext, record: &RevenueFactRecord) -> Result<(), StoreError> {
    let row = encode_row(record)?;
    ctx.warehouse.insert(&ctx.tables.fact_revenue, row).await
}
