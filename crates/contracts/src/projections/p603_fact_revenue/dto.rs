use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Составной ключ факта выручки: исходный платёж + ключ даты
pub fn revenue_key(payment_id: i64, date_key: i32) -> String {
    format!("{}_{}", payment_id, date_key)
}

/// Факт выручки (`fact_revenue`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueFactRecord {
    pub revenue_key: String,
    pub payment_id: i64,
    pub member_id: i64,
    pub member_key: i64,
    pub date_key: i32,
    pub amount: f64,
    pub payment_type: Option<String>,
    pub membership_type: Option<String>,
    pub payment_time: NaiveDateTime,
    pub loaded_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedRevenueKey {
    pub revenue_key: String,
}
