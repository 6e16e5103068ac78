use chrono::{Datelike, Duration, NaiveDate};
use contracts::projections::p601_dim_date::dto::{date_key, DateDimensionRecord};
use std::collections::HashSet;

use crate::shared::etl_error::EtlError;

/// Потолок окна в каждую сторону (около ста лет)
const MAX_WINDOW_DAYS: i64 = 36_600;

/// Окно календаря `[today - days_back, today + days_forward]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateWindow {
    pub fn around(today: NaiveDate, days_back: i64, days_forward: i64) -> Result<Self, EtlError> {
        for (name, value) in [("days_back", days_back), ("days_forward", days_forward)] {
            if !(0..=MAX_WINDOW_DAYS).contains(&value) {
                return Err(EtlError::InvalidWindow(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_WINDOW_DAYS, value
                )));
            }
        }

        let first = today.checked_sub_signed(Duration::days(days_back));
        let last = today.checked_add_signed(Duration::days(days_forward));
        match (first, last) {
            (Some(first), Some(last)) => Ok(Self { first, last }),
            _ => Err(EtlError::InvalidWindow(format!(
                "window around {} is out of the calendar range",
                today
            ))),
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first.iter_days().take_while({
            let last = self.last;
            move |d| *d <= last
        })
    }

    pub fn len(&self) -> usize {
        ((self.last - self.first).num_days() + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

/// Строка календаря для одного дня
pub fn build_day(date: NaiveDate) -> DateDimensionRecord {
    let day_of_week = date.weekday().number_from_monday();
    DateDimensionRecord {
        date_key: date_key(date),
        full_date: date,
        year: date.year(),
        quarter: (date.month() - 1) / 3 + 1,
        month: date.month(),
        month_name: date.format("%B").to_string(),
        day: date.day(),
        day_of_week,
        day_name: date.format("%A").to_string(),
        is_weekend: day_of_week >= 6,
    }
}

/// Дни окна, которых ещё нет в измерении
pub fn missing_days(window: &DateWindow, existing: &HashSet<i32>) -> Vec<DateDimensionRecord> {
    window
        .days()
        .filter(|d| !existing.contains(&date_key(*d)))
        .map(build_day)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_build_day() {
        let sat = build_day(d(2026, 10, 17));
        assert_eq!(sat.date_key, 20261017);
        assert_eq!(sat.year, 2026);
        assert_eq!(sat.quarter, 4);
        assert_eq!(sat.month_name, "October");
        assert_eq!(sat.day_of_week, 6);
        assert_eq!(sat.day_name, "Saturday");
        assert!(sat.is_weekend);

        let mon = build_day(d(2026, 1, 5));
        assert_eq!(mon.quarter, 1);
        assert_eq!(mon.day_of_week, 1);
        assert!(!mon.is_weekend);
        assert!(build_day(d(2026, 10, 18)).is_weekend);
    }

    #[test]
    fn test_default_window_size() {
        let w = DateWindow::around(d(2026, 10, 17), 365, 180).unwrap();
        assert_eq!(w.first, d(2025, 10, 17));
        assert_eq!(w.last, d(2027, 4, 15));
        assert_eq!(w.len(), 546);
        assert_eq!(w.days().count(), 546);
    }

    #[test]
    fn test_window_rejects_negative() {
        assert!(DateWindow::around(d(2026, 10, 17), -1, 10).is_err());
        assert!(DateWindow::around(d(2026, 10, 17), 1, 1_000_000).is_err());
        let single = DateWindow::around(d(2026, 10, 17), 0, 0).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_missing_days() {
        let w = DateWindow::around(d(2026, 10, 17), 2, 2).unwrap();
        let existing: HashSet<i32> = [20261015, 20261017].into_iter().collect();
        let keys: Vec<i32> = missing_days(&w, &existing).iter().map(|r| r.date_key).collect();
        assert_eq!(keys, vec![20261016, 20261018, 20261019]);
    }
}
