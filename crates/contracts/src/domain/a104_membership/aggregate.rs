use serde::{Deserialize, Serialize};

use crate::shared::lenient::{opt_f64_from_any, opt_string_from_any};

/// Абонемент члена клуба (операционная таблица `memberships`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(alias = "id")]
    pub membership_id: i64,
    pub member_id: i64,
    #[serde(default)]
    pub type_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Тип абонемента (справочник `membership_types`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipType {
    #[serde(alias = "id")]
    pub type_id: i64,
    pub type_name: String,
    #[serde(default, deserialize_with = "opt_f64_from_any")]
    pub price: Option<f64>,
    #[serde(default)]
    pub duration_days: Option<i64>,
}
