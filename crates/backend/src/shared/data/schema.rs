//! Схема таблиц для локального SQLite.
//!
//! В хостинговом бэкенде таблицы создаются администратором; здесь же
//! описан минимальный контракт колонок, с которым работают загрузчики.

use std::collections::HashMap;

use crate::shared::config::TablesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    Bool,
}

impl ColumnKind {
    fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text => "TEXT",
            ColumnKind::Bool => "BOOLEAN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Ограничение в DDL, например `PRIMARY KEY`
    pub constraint: &'static str,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        constraint: "",
    }
}

const fn key(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        constraint: "PRIMARY KEY",
    }
}

const fn serial(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnKind::Integer,
        constraint: "PRIMARY KEY AUTOINCREMENT",
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Индексы: (суффикс имени, список колонок)
    pub indexes: Vec<(&'static str, &'static str)>,
}

impl TableSchema {
    fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            indexes: Vec::new(),
        }
    }

    fn with_index(mut self, suffix: &'static str, columns: &'static str) -> Self {
        self.indexes.push((suffix, columns));
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Колонка первичного ключа
    pub fn key_column(&self) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|c| c.constraint.contains("PRIMARY KEY"))
            .map(|c| c.name)
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.constraint.is_empty() {
                    format!("{} {}", c.name, c.kind.sql_type())
                } else {
                    format!("{} {} {}", c.name, c.kind.sql_type(), c.constraint)
                }
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            self.name,
            columns.join(", ")
        )
    }

    pub fn index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|(suffix, columns)| {
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {} ({});",
                    self.name, suffix, self.name, columns
                )
            })
            .collect()
    }
}

/// Все таблицы: операционные и хранилища
pub fn all_schemas(tables: &TablesConfig) -> Vec<TableSchema> {
    use ColumnKind::*;

    vec![
        // Операционные
        TableSchema::new(
            &tables.members,
            vec![
                key("member_id", Integer),
                col("first_name", Text),
                col("last_name", Text),
                col("email", Text),
                col("phone", Text),
                col("birth_date", Text),
                col("join_date", Text),
                col("status", Text),
            ],
        ),
        TableSchema::new(
            &tables.check_ins,
            vec![
                key("check_in_id", Integer),
                col("member_id", Integer),
                col("check_in_time", Text),
                col("check_out_time", Text),
            ],
        ),
        TableSchema::new(
            &tables.payments,
            vec![
                key("payment_id", Integer),
                col("member_id", Integer),
                col("amount", Real),
                col("payment_type", Text),
                col("payment_date", Text),
                col("membership_id", Integer),
            ],
        ),
        TableSchema::new(
            &tables.memberships,
            vec![
                key("membership_id", Integer),
                col("member_id", Integer),
                col("type_id", Integer),
                col("start_date", Text),
                col("end_date", Text),
                col("status", Text),
            ],
        ),
        TableSchema::new(
            &tables.membership_types,
            vec![
                key("type_id", Integer),
                col("type_name", Text),
                col("price", Real),
                col("duration_days", Integer),
            ],
        ),
        // Хранилище
        TableSchema::new(
            &tables.dim_member,
            vec![
                serial("member_key"),
                col("member_id", Integer),
                col("first_name", Text),
                col("last_name", Text),
                col("email", Text),
                col("member_status", Text),
                col("age_group", Text),
                col("member_since_days", Integer),
                col("valid_from", Text),
                col("valid_to", Text),
                col("is_current", Bool),
            ],
        )
        .with_index("current", "member_id, is_current"),
        TableSchema::new(
            &tables.dim_date,
            vec![
                key("date_key", Integer),
                col("full_date", Text),
                col("year", Integer),
                col("quarter", Integer),
                col("month", Integer),
                col("month_name", Text),
                col("day", Integer),
                col("day_of_week", Integer),
                col("day_name", Text),
                col("is_weekend", Bool),
            ],
        ),
        TableSchema::new(
            &tables.fact_visits,
            vec![
                key("visit_key", Text),
                col("check_in_id", Integer),
                col("member_id", Integer),
                col("member_key", Integer),
                col("date_key", Integer),
                col("time_key", Integer),
                col("check_in_time", Text),
                col("check_out_time", Text),
                col("duration_minutes", Integer),
                col("loaded_at", Text),
            ],
        )
        .with_index("date", "date_key"),
        TableSchema::new(
            &tables.fact_revenue,
            vec![
                key("revenue_key", Text),
                col("payment_id", Integer),
                col("member_id", Integer),
                col("member_key", Integer),
                col("date_key", Integer),
                col("amount", Real),
                col("payment_type", Text),
                col("membership_type", Text),
                col("payment_time", Text),
                col("loaded_at", Text),
            ],
        )
        .with_index("date", "date_key"),
        TableSchema::new(
            &tables.etl_run_log,
            vec![
                key("run_id", Text),
                col("started_at", Text),
                col("finished_at", Text),
                col("status", Text),
                col("summary", Text),
            ],
        ),
    ]
}

/// Таблица -> колонка ключа; по ней упорядочивается постраничное чтение
pub fn key_columns(tables: &TablesConfig) -> HashMap<String, String> {
    all_schemas(tables)
        .into_iter()
        .filter_map(|schema| {
            schema
                .key_column()
                .map(|key| (schema.name.clone(), key.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sql_uses_configured_names() {
        let tables = TablesConfig {
            dim_member: "dwh_dim_member".to_string(),
            ..TablesConfig::default()
        };
        let schemas = all_schemas(&tables);
        let dim = schemas
            .iter()
            .find(|s| s.name == "dwh_dim_member")
            .unwrap();

        let sql = dim.create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS dwh_dim_member ("));
        assert!(sql.contains("member_key INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("is_current BOOLEAN"));
        assert_eq!(
            dim.index_sql(),
            vec!["CREATE INDEX IF NOT EXISTS idx_dwh_dim_member_current ON dwh_dim_member (member_id, is_current);".to_string()]
        );
    }

    #[test]
    fn test_key_columns() {
        let keys = key_columns(&TablesConfig::default());
        assert_eq!(keys.get("dim_member").map(String::as_str), Some("member_key"));
        assert_eq!(keys.get("fact_visits").map(String::as_str), Some("visit_key"));
        assert_eq!(keys.get("check_ins").map(String::as_str), Some("check_in_id"));
    }

    #[test]
    fn test_every_table_has_a_key() {
        for schema in all_schemas(&TablesConfig::default()) {
            assert!(
                schema.columns.iter().any(|c| c.constraint.contains("PRIMARY KEY")),
                "{} has no key",
                schema.name
            );
        }
    }
}
