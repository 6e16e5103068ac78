use chrono::NaiveDate;
use contracts::projections::p600_dim_member::dto::MemberDimensionRecord;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

use crate::shared::data::{decode_rows, encode_row, Decoded, Filter, Row, StoreError};
use crate::shared::etl_context::EtlContext;

/// Текущие версии измерения
#[derive(Debug, Clone, Default)]
pub struct CurrentVersions {
    pub records: Vec<MemberDimensionRecord>,
    /// Члены, у которых есть текущая строка, не прошедшая разбор
    pub unreadable_members: HashSet<i64>,
    /// Неразбираемые строки без member_id
    pub orphan_rows: usize,
}

pub async fn list_current(ctx: &EtlContext) -> Result<CurrentVersions, StoreError> {
    let rows = ctx
        .warehouse
        .read(
            &ctx.tables.dim_member,
            &Filter::all().eq("is_current", true).order_by("member_key"),
        )
        .await?;

    let mut versions = CurrentVersions::default();
    for row in rows {
        let member_id = row.get("member_id").and_then(Value::as_i64);
        match serde_json::from_value::<MemberDimensionRecord>(Value::Object(row)) {
            Ok(record) => versions.records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Undecodable current row in {} (member_id {:?}): {}",
                    ctx.tables.dim_member,
                    member_id,
                    e
                );
                match member_id {
                    Some(id) => {
                        versions.unreadable_members.insert(id);
                    }
                    None => versions.orphan_rows += 1,
                }
            }
        }
    }
    Ok(versions)
}

/// Все версии (включая закрытые)
pub async fn list_all(ctx: &EtlContext) -> Result<Decoded<MemberDimensionRecord>, StoreError> {
    let rows = ctx
        .warehouse
        .read(&ctx.tables.dim_member, &Filter::all().order_by("member_key"))
        .await?;
    Ok(decode_rows(&ctx.tables.dim_member, rows))
}

/// member_id -> member_key текущей версии
///
/// При нескольких текущих версиях берётся самая поздняя.
pub async fn current_keys_by_member(ctx: &EtlContext) -> Result<HashMap<i64, i64>, StoreError> {
    let current = list_current(ctx).await?;
    let mut keys: HashMap<i64, (NaiveDate, i64)> = HashMap::new();

    for record in current.records {
        let Some(member_key) = record.member_key else {
            continue;
        };
        let candidate = (record.valid_from, member_key);
        keys.entry(record.member_id)
            .and_modify(|best| {
                if candidate > *best {
                    *best = candidate;
                }
            })
            .or_insert(candidate);
    }

    Ok(keys
        .into_iter()
        .map(|(member_id, (_, member_key))| (member_id, member_key))
        .collect())
}

pub async fn insert_version(
    ctx: &EtlContext,
    record: &MemberDimensionRecord,
) -> Result<(), StoreError> {
    let row = encode_row(record)?;
    ctx.warehouse.insert(&ctx.tables.dim_member, row).await
}

/// Закрыть версию: `valid_to = valid_to`, `is_current = false`
pub async fn close_version(
    ctx: &EtlContext,
    member_key: i64,
    valid_to: NaiveDate,
) -> Result<(), StoreError> {
    let mut patch = Row::new();
    patch.insert("valid_to".to_string(), json!(valid_to.to_string()));
    patch.insert("is_current".to_string(), json!(false));

    ctx.warehouse
        .update(
            &ctx.tables.dim_member,
            &Filter::all().eq("member_key", member_key),
            patch,
        )
        .await
}
