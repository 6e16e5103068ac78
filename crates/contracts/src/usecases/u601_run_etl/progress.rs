use serde::{Deserialize, Serialize};

/// Счётчики одного загрузчика
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Новые строки
    pub inserted: usize,
    /// Изменённые существующие строки (закрытые версии, завершённые визиты)
    pub updated: usize,
    /// Исходные записи, не потребовавшие записи
    pub unchanged: usize,
    /// Пропущенные из-за качества данных
    pub skipped: usize,
    /// Ошибки доступа к хранилищу на уровне записи
    pub failed: usize,
    /// Нарушения инварианта (несколько текущих версий одного члена)
    pub invariant_violations: usize,
}

impl LoadStats {
    pub fn has_problems(&self) -> bool {
        self.failed > 0 || self.invariant_violations > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Все загрузчики отработали без ошибок
    Completed,
    /// Хотя бы один загрузчик упал или посчитал ошибки
    CompletedWithErrors,
}

impl RunStatus {
    pub fn code(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed_with_errors",
        }
    }
}
