use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::store::{compare_values, Filter, Row, StoreError, TableStore};

/// Операция хранилища (для внедрения отказов)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Read,
    Insert,
    Update,
    Delete,
}

impl StoreOp {
    fn name(&self) -> &'static str {
        match self {
            StoreOp::Read => "read",
            StoreOp::Insert => "insert",
            StoreOp::Update => "update",
            StoreOp::Delete => "delete",
        }
    }
}

/// Хранилище в памяти: прогон без внешней БД и тесты
///
/// Суррогатные ключи выдаются счётчиком по таблице (`with_serial`).
#[derive(Default)]
pub struct MemoryTableStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    serials: Mutex<HashMap<String, (String, i64)>>,
    failures: Mutex<HashSet<(StoreOp, String)>>,
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Колонка `column` таблицы `table` заполняется автоинкрементом при вставке
    pub fn with_serial(self, table: &str, column: &str) -> Self {
        guard(&self.serials).insert(table.to_string(), (column.to_string(), 1));
        self
    }

    /// Положить строки напрямую, минуя счётчики и отказы
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = guard(&self.tables);
        let entry = tables.entry(table.to_string()).or_default();
        for row in rows {
            if let Value::Object(map) = row {
                entry.push(map);
            }
        }
    }

    /// Текущее содержимое таблицы
    pub fn rows(&self, table: &str) -> Vec<Row> {
        guard(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Следующие вызовы `op` на `table` завершаются ошибкой
    pub fn fail_on(&self, op: StoreOp, table: &str) {
        guard(&self.failures).insert((op, table.to_string()));
    }

    pub fn clear_failures(&self) {
        guard(&self.failures).clear();
    }

    fn check_failure(&self, op: StoreOp, table: &str) -> Result<(), StoreError> {
        if guard(&self.failures).contains(&(op, table.to_string())) {
            return Err(StoreError::Injected {
                op: op.name(),
                table: table.to_string(),
            });
        }
        Ok(())
    }

    fn assign_serial(&self, table: &str, row: &mut Row) {
        let mut serials = guard(&self.serials);
        if let Some((column, next)) = serials.get_mut(table) {
            match row.get(column.as_str()).and_then(Value::as_i64) {
                Some(given) => {
                    if given >= *next {
                        *next = given + 1;
                    }
                }
                None => {
                    row.insert(column.clone(), Value::from(*next));
                    *next += 1;
                }
            }
        }
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        self.check_failure(StoreOp::Read, table)?;

        let tables = guard(&self.tables);
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(column) = &filter.order_by {
            rows.sort_by(|a, b| compare_values(a.get(column), b.get(column)));
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<(), StoreError> {
        self.check_failure(StoreOp::Insert, table)?;

        self.assign_serial(table, &mut row);
        guard(&self.tables)
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn update(&self, table: &str, key: &Filter, patch: Row) -> Result<(), StoreError> {
        self.check_failure(StoreOp::Update, table)?;

        let mut tables = guard(&self.tables);
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| key.matches(r)) {
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), StoreError> {
        self.check_failure(StoreOp::Delete, table)?;

        let mut tables = guard(&self.tables);
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_serial_keys_are_assigned() {
        let store = MemoryTableStore::new().with_serial("dim_member", "member_key");

        store
            .insert("dim_member", row(json!({ "member_id": 1 })))
            .await
            .unwrap();
        store
            .insert("dim_member", row(json!({ "member_id": 2 })))
            .await
            .unwrap();

        let rows = store
            .read("dim_member", &Filter::all().order_by("member_key"))
            .await
            .unwrap();
        assert_eq!(rows[0]["member_key"], json!(1));
        assert_eq!(rows[1]["member_key"], json!(2));
    }

    #[tokio::test]
    async fn test_update_and_delete_by_filter() {
        let store = MemoryTableStore::new();
        store.seed(
            "t",
            vec![json!({ "k": 1, "v": "a" }), json!({ "k": 2, "v": "b" })],
        );

        store
            .update("t", &Filter::all().eq("k", 2), row(json!({ "v": "c" })))
            .await
            .unwrap();
        let rows = store.read("t", &Filter::all().eq("k", 2)).await.unwrap();
        assert_eq!(rows[0]["v"], json!("c"));

        store
            .delete("t", &Filter::all().not_null("k"))
            .await
            .unwrap();
        assert!(store.rows("t").is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryTableStore::new();
        store.fail_on(StoreOp::Read, "t");

        let err = store.read("t", &Filter::all()).await.unwrap_err();
        assert!(matches!(err, StoreError::Injected { op: "read", .. }));

        store.clear_failures();
        assert!(store.read("t", &Filter::all()).await.unwrap().is_empty());
    }
}
