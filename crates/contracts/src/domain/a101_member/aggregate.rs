use serde::{Deserialize, Serialize};

use crate::shared::lenient::{opt_string_from_any, string_or_default};

/// Статус членства
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn code(&self) -> &'static str {
        match self {
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Inactive => "INACTIVE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(MemberStatus::Active),
            "INACTIVE" => Some(MemberStatus::Inactive),
            _ => None,
        }
    }
}

/// Член клуба (операционная таблица `members`)
///
/// Даты рождения и вступления хранятся сырыми строками: источник их не
/// валидирует, а загрузчик измерения разбирает их нестрого.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(alias = "id")]
    pub member_id: i64,
    #[serde(default, deserialize_with = "string_or_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub join_date: Option<String>,
    pub status: MemberStatus,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}
