use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

/// Строка таблицы в том виде, в каком её отдаёт и принимает хранилище
pub type Row = Map<String, Value>;

/// Ошибки доступа к хранилищу
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for table {table}: {body}")]
    Http {
        table: String,
        status: u16,
        body: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid value for {table}.{column}: {value}")]
    InvalidValue {
        table: String,
        column: String,
        value: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Row must be a JSON object, got: {0}")]
    NotAnObject(String),

    #[error("Injected failure: {op} on {table}")]
    Injected { op: &'static str, table: String },
}

/// Предикат фильтра
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    NotNull(String),
}

/// Фильтр выборки: конъюнкция предикатов и необязательная сортировка по возрастанию
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
    pub order_by: Option<String>,
}

impl Filter {
    /// Без условий (вся таблица)
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::NotNull(column.to_string()));
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by = Some(column.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Проверка строки в памяти (для хранилищ без собственного движка запросов)
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| match c {
            Condition::Eq(column, expected) => row
                .get(column)
                .map(|actual| values_equal(actual, expected))
                .unwrap_or(false),
            Condition::NotNull(column) => row.get(column).map(|v| !v.is_null()).unwrap_or(false),
        })
    }
}

/// Равенство JSON-значений с учётом того, что 1 и 1.0 это одно число
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// Порядок JSON-значений для сортировки: null первым, числа по значению, строки лексикографически
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = |v: Option<&Value>| match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    };
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Коллаборатор доступа к таблицам (операционным и хранилища)
///
/// Каждый вызов это отдельная неатомарная операция; транзакций между
/// вызовами нет, повторов тоже.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Имя бэкенда для логов
    fn backend_name(&self) -> &'static str;

    /// Снимок строк таблицы, удовлетворяющих фильтру
    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    /// Вставка одной строки
    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError>;

    /// Частичное обновление строк, отобранных фильтром по ключу
    async fn update(&self, table: &str, key: &Filter, patch: Row) -> Result<(), StoreError>;

    /// Удаление строк (только для служебной очистки)
    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), StoreError>;
}

/// Сериализовать запись в строку хранилища
pub fn encode_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::NotAnObject(other.to_string())),
    }
}

/// Результат разбора строк в типизированные записи
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub items: Vec<T>,
    /// Сколько строк не удалось разобрать (они пропущены)
    pub rejected: usize,
}

/// Разобрать строки; неразбираемые пропускаются с предупреждением
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Decoded<T> {
    let mut items = Vec::with_capacity(rows.len());
    let mut rejected = 0;

    for row in rows {
        match serde_json::from_value::<T>(Value::Object(row)) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!("Skipping undecodable row in {}: {}", table, e);
                rejected += 1;
            }
        }
    }

    Decoded { items, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_matches() {
        let r = row(json!({ "member_id": 7, "is_current": true, "email": null }));

        assert!(Filter::all().matches(&r));
        assert!(Filter::all().eq("member_id", 7).matches(&r));
        assert!(Filter::all().eq("member_id", 7.0).matches(&r));
        assert!(!Filter::all().eq("member_id", 8).matches(&r));
        assert!(Filter::all()
            .eq("member_id", 7)
            .eq("is_current", true)
            .matches(&r));
        assert!(!Filter::all().not_null("email").matches(&r));
        assert!(!Filter::all().eq("missing", 1).matches(&r));
    }

    #[test]
    fn test_decode_rows_skips_bad_rows() {
        #[derive(serde::Deserialize)]
        struct Item {
            #[allow(dead_code)]
            id: i64,
        }

        let rows = vec![row(json!({ "id": 1 })), row(json!({ "id": "x" })), row(json!({ "id": 3 }))];
        let decoded: Decoded<Item> = decode_rows("items", rows);

        assert_eq!(decoded.items.len(), 2);
        assert_eq!(decoded.rejected, 1);
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(Some(&json!(2)), Some(&json!(10))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
    }
}
