use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Основные показатели дня для панели
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: Option<NaiveDate>,
    pub total_members: usize,
    pub active_members: usize,
    pub today_visits: usize,
    pub unique_visitors: usize,
    /// Отметились сегодня и ещё не вышли
    pub currently_inside: usize,
    /// Строк в `dim_member` (все версии)
    pub dwh_records: usize,
    pub active_memberships: usize,
}
