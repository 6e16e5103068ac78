use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::schema::{all_schemas, ColumnDef, ColumnKind, TableSchema};
use super::store::{Condition, Filter, Row, StoreError, TableStore};
use crate::shared::config::TablesConfig;

/// Хранилище на локальном SQLite (sea-orm, сырые запросы)
///
/// Имена таблиц и колонок берутся только из известной схемы, значения
/// передаются параметрами.
pub struct SqliteTableStore {
    conn: DatabaseConnection,
    schemas: HashMap<String, TableSchema>,
}

impl SqliteTableStore {
    /// Открыть (или создать) файл базы и создать недостающие таблицы
    pub async fn connect(db_file: &Path, tables: &TablesConfig) -> Result<Self, StoreError> {
        if let Some(parent) = db_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let absolute_path = if db_file.is_absolute() {
            db_file.to_path_buf()
        } else {
            std::env::current_dir()?.join(db_file)
        };
        // Normalize path separators and ensure proper URL form on Windows
        let normalized = absolute_path.to_string_lossy().replace('\\', "/");
        let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
        let prefix = if needs_leading_slash { "/" } else { "" };
        let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

        Self::open(db_url, tables).await
    }

    /// База в памяти процесса (одно соединение, иначе у каждого своя база)
    pub async fn in_memory(tables: &TablesConfig) -> Result<Self, StoreError> {
        Self::open("sqlite::memory:".to_string(), tables).await
    }

    async fn open(db_url: String, tables: &TablesConfig) -> Result<Self, StoreError> {
        let mut options = ConnectOptions::new(db_url);
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let conn = Database::connect(options).await?;

        let schemas = all_schemas(tables)
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();
        let store = Self { conn, schemas };
        store.bootstrap().await?;
        Ok(store)
    }

    async fn bootstrap(&self) -> Result<(), StoreError> {
        for schema in self.schemas.values() {
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Sqlite,
                    schema.create_sql(),
                ))
                .await?;
            for sql in schema.index_sql() {
                self.conn
                    .execute(Statement::from_string(DatabaseBackend::Sqlite, sql))
                    .await?;
            }
        }
        tracing::info!("SQLite schema ready ({} tables)", self.schemas.len());
        Ok(())
    }

    fn schema(&self, table: &str) -> Result<&TableSchema, StoreError> {
        self.schemas
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn column<'a>(schema: &'a TableSchema, name: &str) -> Result<&'a ColumnDef, StoreError> {
        schema.column(name).ok_or_else(|| StoreError::UnknownColumn {
            table: schema.name.clone(),
            column: name.to_string(),
        })
    }

    fn where_clause(
        schema: &TableSchema,
        filter: &Filter,
        params: &mut Vec<sea_orm::Value>,
    ) -> Result<String, StoreError> {
        if filter.is_empty() {
            return Ok(String::new());
        }

        let mut parts = Vec::with_capacity(filter.conditions.len());
        for condition in &filter.conditions {
            match condition {
                Condition::Eq(name, value) => {
                    let column = Self::column(schema, name)?;
                    if value.is_null() {
                        parts.push(format!("{} IS NULL", column.name));
                    } else {
                        parts.push(format!("{} = ?", column.name));
                        params.push(to_sql_value(&schema.name, column, value)?);
                    }
                }
                Condition::NotNull(name) => {
                    let column = Self::column(schema, name)?;
                    parts.push(format!("{} IS NOT NULL", column.name));
                }
            }
        }
        Ok(format!(" WHERE {}", parts.join(" AND ")))
    }
}

/// JSON -> значение параметра по типу колонки
fn to_sql_value(
    table: &str,
    column: &ColumnDef,
    value: &Value,
) -> Result<sea_orm::Value, StoreError> {
    let invalid = || StoreError::InvalidValue {
        table: table.to_string(),
        column: column.name.to_string(),
        value: value.to_string(),
    };

    let converted: sea_orm::Value = match column.kind {
        ColumnKind::Integer => {
            let v: Option<i64> = match value {
                Value::Null => None,
                Value::Number(n) => Some(
                    n.as_i64()
                        .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                        .ok_or_else(invalid)?,
                ),
                Value::Bool(b) => Some(i64::from(*b)),
                Value::String(s) => Some(s.trim().parse::<i64>().map_err(|_| invalid())?),
                _ => return Err(invalid()),
            };
            v.into()
        }
        ColumnKind::Real => {
            let v: Option<f64> = match value {
                Value::Null => None,
                Value::Number(n) => Some(n.as_f64().ok_or_else(invalid)?),
                Value::String(s) => Some(s.trim().parse::<f64>().map_err(|_| invalid())?),
                _ => return Err(invalid()),
            };
            v.into()
        }
        ColumnKind::Text => {
            let v: Option<String> = match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            v.into()
        }
        ColumnKind::Bool => {
            let v: Option<bool> = match value {
                Value::Null => None,
                Value::Bool(b) => Some(*b),
                Value::Number(n) => Some(n.as_i64().ok_or_else(invalid)? != 0),
                Value::String(s) => match s.trim() {
                    "true" | "t" | "1" => Some(true),
                    "false" | "f" | "0" => Some(false),
                    _ => return Err(invalid()),
                },
                _ => return Err(invalid()),
            };
            v.into()
        }
    };
    Ok(converted)
}

/// Строка результата -> JSON по типам колонок схемы
fn from_query_result(schema: &TableSchema, result: &QueryResult) -> Result<Row, StoreError> {
    let mut row = Row::new();
    for column in &schema.columns {
        let value = match column.kind {
            ColumnKind::Integer => result
                .try_get::<Option<i64>>("", column.name)?
                .map(Value::from),
            ColumnKind::Real => result
                .try_get::<Option<f64>>("", column.name)?
                .map(Value::from),
            ColumnKind::Text => result
                .try_get::<Option<String>>("", column.name)?
                .map(Value::from),
            ColumnKind::Bool => result
                .try_get::<Option<bool>>("", column.name)?
                .map(Value::from),
        };
        row.insert(column.name.to_string(), value.unwrap_or(Value::Null));
    }
    Ok(row)
}

#[async_trait]
impl TableStore for SqliteTableStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let schema = self.schema(table)?;
        let columns: Vec<&str> = schema.columns.iter().map(|c| c.name).collect();

        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), schema.name);
        sql.push_str(&Self::where_clause(schema, filter, &mut params)?);
        if let Some(order) = &filter.order_by {
            let column = Self::column(schema, order)?;
            sql.push_str(&format!(" ORDER BY {} ASC", column.name));
        }

        let stmt = Statement::from_sql_and_values(DatabaseBackend::Sqlite, &sql, params);
        let results = self.conn.query_all(stmt).await?;

        results
            .iter()
            .map(|r| from_query_result(schema, r))
            .collect()
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        let schema = self.schema(table)?;

        let mut names = Vec::with_capacity(row.len());
        let mut params = Vec::with_capacity(row.len());
        for (name, value) in &row {
            let column = Self::column(schema, name)?;
            names.push(column.name);
            params.push(to_sql_value(&schema.name, column, value)?);
        }
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.name,
            names.join(", "),
            placeholders
        );

        self.conn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                &sql,
                params,
            ))
            .await?;
        Ok(())
    }

    async fn update(&self, table: &str, key: &Filter, patch: Row) -> Result<(), StoreError> {
        let schema = self.schema(table)?;
        if patch.is_empty() {
            return Ok(());
        }

        let mut params = Vec::with_capacity(patch.len() + key.conditions.len());
        let mut assignments = Vec::with_capacity(patch.len());
        for (name, value) in &patch {
            let column = Self::column(schema, name)?;
            assignments.push(format!("{} = ?", column.name));
            params.push(to_sql_value(&schema.name, column, value)?);
        }
        let mut sql = format!("UPDATE {} SET {}", schema.name, assignments.join(", "));
        sql.push_str(&Self::where_clause(schema, key, &mut params)?);

        self.conn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                &sql,
                params,
            ))
            .await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), StoreError> {
        let schema = self.schema(table)?;

        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", schema.name);
        sql.push_str(&Self::where_clause(schema, filter, &mut params)?);

        self.conn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                &sql,
                params,
            ))
            .await?;
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
    async fn test_roundtrip_through_sqlite() {
        let tables = TablesConfig::default();
        let store = SqliteTableStore::in_memory(&tables).await.unwrap();

        store
            .insert(
                "dim_member",
                row(json!({
                    "member_id": 1,
                    "first_name": "Anna",
                    "member_status": "ACTIVE",
                    "valid_from": "2025-01-01",
                    "valid_to": "2099-12-31",
                    "is_current": true
                })),
            )
            .await
            .unwrap();

        let current = store
            .read("dim_member", &Filter::all().eq("is_current", true))
            .await
            .unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0]["member_key"], json!(1));
        assert_eq!(current[0]["is_current"], json!(true));
        assert_eq!(current[0]["email"], Value::Null);

        store
            .update(
                "dim_member",
                &Filter::all().eq("member_key", 1),
                row(json!({ "is_current": false, "valid_to": "2025-02-01" })),
            )
            .await
            .unwrap();

        let current = store
            .read("dim_member", &Filter::all().eq("is_current", true))
            .await
            .unwrap();
        assert!(current.is_empty());

        store
            .delete("dim_member", &Filter::all().not_null("member_key"))
            .await
            .unwrap();
        assert!(store
            .read("dim_member", &Filter::all())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_names() {
        let store = SqliteTableStore::in_memory(&TablesConfig::default())
            .await
            .unwrap();

        let err = store.read("nope", &Filter::all()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(_)));

        let err = store
            .insert("members", row(json!({ "member_id": 1, "drop table": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
    }

    #[test]
    fn test_to_sql_value_conversions() {
        let schema = all_schemas(&TablesConfig::default())
            .into_iter()
            .find(|s| s.name == "payments")
            .unwrap();
        let amount = schema.column("amount").unwrap();
        let member = schema.column("member_id").unwrap();

        assert_eq!(
            to_sql_value("payments", amount, &json!("12.5")).unwrap(),
            sea_orm::Value::Double(Some(12.5))
        );
        assert_eq!(
            to_sql_value("payments", member, &json!(3.0)).unwrap(),
            sea_orm::Value::BigInt(Some(3))
        );
        assert!(to_sql_value("payments", member, &json!("abc")).is_err());
    }
}
