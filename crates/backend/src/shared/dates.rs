//! Нестрогий разбор дат из операционных таблиц.
//!
//! Источник хранит даты как попало: `2024-05-01`, `2024-05-01T09:00:00`,
//! `2024-05-01 09:00:00+00`, RFC 3339. Неразбираемое значение даёт `None`,
//! а не ошибку: загрузчики подставляют значения по умолчанию.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Момент времени; смещение отбрасывается, остаётся "настенное" время источника
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Календарная дата; для отметок времени берётся их дата
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

pub fn parse_opt_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_date)
}

/// Полных лет между датами (возраст). `None`, если `from` позже `to`.
pub fn whole_years_between(from: NaiveDate, to: NaiveDate) -> Option<i64> {
    if from > to {
        return None;
    }
    let mut years = i64::from(to.year() - from.year());
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    Some(years)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = d(2024, 5, 1).and_hms_opt(9, 15, 0).unwrap();

        assert_eq!(parse_datetime("2024-05-01T09:15:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-01 09:15:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-01T09:15"), Some(expected));
        assert_eq!(parse_datetime("2024-05-01T09:15:00.123"), Some(d(2024, 5, 1).and_hms_milli_opt(9, 15, 0, 123).unwrap()));
        assert_eq!(parse_datetime("2024-05-01T09:15:00+02:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-01 09:15:00+00"), Some(expected));
        assert_eq!(
            parse_datetime("2024-05-01"),
            Some(d(2024, 5, 1).and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("1990-02-28"), Some(d(1990, 2, 28)));
        assert_eq!(parse_date("1990-02-28T23:59:00Z"), Some(d(1990, 2, 28)));
        assert_eq!(parse_date("1990-02-30"), None);
        assert_eq!(parse_opt_date(None), None);
    }

    #[test]
    fn test_whole_years_between() {
        let today = d(2026, 10, 17);
        assert_eq!(whole_years_between(d(2001, 10, 17), today), Some(25));
        assert_eq!(whole_years_between(d(2001, 10, 18), today), Some(24));
        assert_eq!(whole_years_between(d(2026, 10, 17), today), Some(0));
        assert_eq!(whole_years_between(d(2027, 1, 1), today), None);
    }
}
