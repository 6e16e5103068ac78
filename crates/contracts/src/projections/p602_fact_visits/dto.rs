use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Составной ключ факта посещения: исходный check-in + ключ даты
pub fn visit_key(check_in_id: i64, date_key: i32) -> String {
    format!("{}_{}", check_in_id, date_key)
}

/// Факт посещения (`fact_visits`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitFactRecord {
    pub visit_key: String,
    pub check_in_id: i64,
    pub member_id: i64,
    pub member_key: i64,
    pub date_key: i32,
    pub time_key: i32,
    pub check_in_time: NaiveDateTime,
    pub check_out_time: Option<NaiveDateTime>,
    /// Пусто, пока визит не завершён
    pub duration_minutes: Option<i64>,
    pub loaded_at: NaiveDateTime,
}

/// Уже загруженный факт: нужен только ключ и признак завершённости
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedVisitKey {
    pub visit_key: String,
    #[serde(default)]
    pub check_out_time: Option<String>,
}

impl LoadedVisitKey {
    pub fn is_open(&self) -> bool {
        self.check_out_time
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    }
}
