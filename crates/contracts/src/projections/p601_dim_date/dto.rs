use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::shared::lenient::bool_from_any;

/// Ключ даты в формате YYYYMMDD
pub fn date_key(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Обратное преобразование ключа в дату (None для невалидного ключа)
pub fn date_from_key(key: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(key / 10_000, (key / 100 % 100) as u32, (key % 100) as u32)
}

/// День календаря в измерении `dim_date`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateDimensionRecord {
    pub date_key: i32,
    pub full_date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub month_name: String,
    pub day: u32,
    /// ISO: 1 = понедельник, 7 = воскресенье
    pub day_of_week: u32,
    pub day_name: String,
    #[serde(deserialize_with = "bool_from_any")]
    pub is_weekend: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_encoding() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(date_key(d), 20240307);
        assert_eq!(date_from_key(20240307), Some(d));
        assert_eq!(date_from_key(20241341), None);
    }
}
