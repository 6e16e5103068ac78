use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shared::lenient::{bool_from_any, string_or_default};

/// Дата-заглушка `valid_to` для открытой (текущей) версии
pub const OPEN_VERSION_VALID_TO: &str = "2099-12-31";

pub fn open_version_valid_to() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Возрастная группа. Нижняя граница включается в старшую группу:
/// 25 лет это уже `25-35`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "<25")]
    Under25,
    #[serde(rename = "25-35")]
    From25To35,
    #[serde(rename = "35-45")]
    From35To45,
    #[serde(rename = "45-55")]
    From45To55,
    #[serde(rename = "55+")]
    From55,
    Unknown,
}

impl AgeGroup {
    pub fn from_age(age: i64) -> Self {
        match age {
            a if a < 0 => AgeGroup::Unknown,
            a if a < 25 => AgeGroup::Under25,
            a if a < 35 => AgeGroup::From25To35,
            a if a < 45 => AgeGroup::From35To45,
            a if a < 55 => AgeGroup::From45To55,
            _ => AgeGroup::From55,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Under25 => "<25",
            AgeGroup::From25To35 => "25-35",
            AgeGroup::From35To45 => "35-45",
            AgeGroup::From45To55 => "45-55",
            AgeGroup::From55 => "55+",
            AgeGroup::Unknown => "Unknown",
        }
    }
}

/// Версия члена клуба в измерении `dim_member` (SCD Type 2)
///
/// `member_key` генерирует хранилище при вставке, поэтому у ещё не
/// записанной версии он пуст и не сериализуется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDimensionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_key: Option<i64>,
    pub member_id: i64,

    // Отслеживаемые атрибуты
    #[serde(default, deserialize_with = "string_or_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub member_status: String,

    // Производные атрибуты
    pub age_group: AgeGroup,
    pub member_since_days: i64,

    // Версионирование
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    #[serde(deserialize_with = "bool_from_any")]
    pub is_current: bool,
}

impl MemberDimensionRecord {
    /// Совпадают ли отслеживаемые атрибуты двух версий
    pub fn same_tracked_attributes(&self, other: &MemberDimensionRecord) -> bool {
        self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.email == other.email
            && self.member_status == other.member_status
    }
}
