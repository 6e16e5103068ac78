use serde::{Deserialize, Serialize};

use crate::shared::lenient::opt_string_from_any;

/// Отметка посещения (операционная таблица `check_ins`)
///
/// `check_out_time` пуст, пока посетитель в зале.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    #[serde(alias = "id")]
    pub check_in_id: i64,
    pub member_id: i64,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub check_in_time: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub check_out_time: Option<String>,
}
