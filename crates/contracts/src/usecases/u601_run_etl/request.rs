use serde::{Deserialize, Serialize};

/// Запрос на запуск ETL
///
/// Все поля необязательны: без них используется окно дат из конфигурации.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EtlRunRequest {
    /// Сколько дней назад от сегодняшнего начинается окно `dim_date`
    #[serde(default)]
    pub days_back: Option<i64>,

    /// Сколько дней вперёд от сегодняшнего заканчивается окно `dim_date`
    #[serde(default)]
    pub days_forward: Option<i64>,
}
