use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::progress::{LoadStats, RunStatus};

/// Итог одного загрузчика в прогоне
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderOutcome {
    /// Имя таблицы хранилища
    pub table: String,
    pub stats: LoadStats,
    /// Ошибка, из-за которой загрузчик не отработал целиком
    pub error: Option<String>,
}

/// Отчёт о прогоне ETL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlRunReport {
    pub run_id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub status: RunStatus,
    /// Таблица -> количество новых строк. Ноль это нормальный результат.
    pub tables: BTreeMap<String, usize>,
    /// В порядке запуска загрузчиков
    pub outcomes: Vec<LoaderOutcome>,
}

impl EtlRunReport {
    pub fn total_written(&self) -> usize {
        self.tables.values().sum()
    }
}

/// Запись журнала прогонов (`etl_run_log`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlRunLogEntry {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub status: String,
    /// JSON отчёта `EtlRunReport`
    pub summary: String,
}
