//! Общие заготовки для тестов загрузчиков

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

use super::clock::FixedClock;
use super::config::{EtlSettings, TablesConfig};
use super::data::memory_store::MemoryTableStore;
use super::data::Row;
use super::etl_context::EtlContext;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Контекст над хранилищем в памяти с часами, остановленными на `today`
pub fn memory_ctx(today: NaiveDate) -> (Arc<MemoryTableStore>, EtlContext) {
    let tables = TablesConfig::default();
    let store = Arc::new(MemoryTableStore::new().with_serial(&tables.dim_member, "member_key"));
    let ctx = EtlContext::new(
        store.clone(),
        tables,
        EtlSettings::default(),
        Arc::new(FixedClock::on(today)),
    );
    (store, ctx)
}

/// Тот же контекст, часы переставлены на другой день
pub fn at(ctx: &EtlContext, today: NaiveDate) -> EtlContext {
    EtlContext {
        clock: Arc::new(FixedClock::on(today)),
        ..ctx.clone()
    }
}

pub fn field<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}
