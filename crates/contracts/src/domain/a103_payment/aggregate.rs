use serde::{Deserialize, Serialize};

use crate::shared::lenient::{opt_f64_from_any, opt_string_from_any};

/// Платёж (операционная таблица `payments`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(alias = "id")]
    pub payment_id: i64,
    pub member_id: i64,
    #[serde(default, deserialize_with = "opt_f64_from_any")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub membership_id: Option<i64>,
}
