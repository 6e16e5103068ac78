use chrono::{NaiveDateTime, Timelike};
use contracts::domain::a102_check_in::aggregate::CheckIn;
use contracts::projections::p601_dim_date::dto::date_key;
use contracts::projections::p602_fact_visits::dto::{visit_key, LoadedVisitKey, VisitFactRecord};
use std::collections::{HashMap, HashSet};

use crate::shared::config::TimeBucket;
use crate::shared::dates::parse_datetime;

/// Квантованное время суток: 09:37 -> 930 (четверть часа) или 900 (час)
pub fn time_key(at: NaiveDateTime, bucket: TimeBucket) -> i32 {
    let hour = at.hour() as i32;
    let minute = at.minute() as i32;
    match bucket {
        TimeBucket::QuarterHour => hour * 100 + minute / 15 * 15,
        TimeBucket::Hour => hour * 100,
    }
}

/// Длительность визита в целых минутах
///
/// Выход раньше входа даёт 0 и флаг `true`, чтобы вызывающий мог предупредить.
pub fn duration_minutes(check_in: NaiveDateTime, check_out: NaiveDateTime) -> (i64, bool) {
    let minutes = (check_out - check_in).num_minutes();
    if minutes < 0 {
        (0, true)
    } else {
        (minutes, false)
    }
}

/// Завершение ранее загруженного открытого визита
#[derive(Debug, Clone, PartialEq)]
pub struct VisitCompletion {
    pub visit_key: String,
    pub check_out_time: NaiveDateTime,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitPlan {
    pub inserts: Vec<VisitFactRecord>,
    pub completions: Vec<VisitCompletion>,
    pub unchanged: usize,
    /// check_in_id без разбираемого `check_in_time`
    pub invalid_time: Vec<i64>,
    /// check_in_id, для члена которых нет текущей версии в измерении
    pub missing_member: Vec<i64>,
    /// check_in_id с выходом раньше входа
    pub negative_duration: Vec<i64>,
}

impl VisitPlan {
    pub fn skipped(&self) -> usize {
        self.invalid_time.len() + self.missing_member.len()
    }
}

fn checked_duration(check_in_id: i64, check_in: NaiveDateTime, check_out: NaiveDateTime, plan: &mut VisitPlan) -> i64 {
    let (minutes, negative) = duration_minutes(check_in, check_out);
    if negative {
        plan.negative_duration.push(check_in_id);
    }
    minutes
}

/// Спланировать инкрементальную загрузку визитов
///
/// Новый `visit_key` даёт вставку; уже загруженный открытый визит, у
/// которого в источнике появился выход, даёт завершение; остальное не трогается.
pub fn plan(
    check_ins: &[CheckIn],
    loaded: &HashMap<String, LoadedVisitKey>,
    member_keys: &HashMap<i64, i64>,
    bucket: TimeBucket,
    loaded_at: NaiveDateTime,
) -> VisitPlan {
    let mut plan = VisitPlan::default();
    let mut seen = HashSet::new();

    for check_in in check_ins {
        let Some(check_in_time) = check_in.check_in_time.as_deref().and_then(parse_datetime) else {
            plan.invalid_time.push(check_in.check_in_id);
            continue;
        };
        let check_out_time = check_in.check_out_time.as_deref().and_then(parse_datetime);

        let day_key = date_key(check_in_time.date());
        let key = visit_key(check_in.check_in_id, day_key);
        if !seen.insert(key.clone()) {
            plan.unchanged += 1;
            continue;
        }

        if let Some(existing) = loaded.get(&key) {
            match check_out_time {
                Some(check_out) if existing.is_open() => {
                    let duration =
                        checked_duration(check_in.check_in_id, check_in_time, check_out, &mut plan);
                    plan.completions.push(VisitCompletion {
                        visit_key: key,
                        check_out_time: check_out,
                        duration_minutes: duration,
                    });
                }
                _ => plan.unchanged += 1,
            }
            continue;
        }

        let Some(member_key) = member_keys.get(&check_in.member_id).copied() else {
            plan.missing_member.push(check_in.check_in_id);
            continue;
        };

        let duration_minutes = check_out_time
            .map(|check_out| checked_duration(check_in.check_in_id, check_in_time, check_out, &mut plan));

        plan.inserts.push(VisitFactRecord {
            visit_key: key,
            check_in_id: check_in.check_in_id,
            member_id: check_in.member_id,
            member_key,
            date_key: day_key,
            time_key: time_key(check_in_time, bucket),
            check_in_time,
            check_out_time,
            duration_minutes,
            loaded_at,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 12)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn check_in(id: i64, member_id: i64, time_in: &str, time_out: Option<&str>) -> CheckIn {
        CheckIn {
            check_in_id: id,
            member_id,
            check_in_time: Some(time_in.to_string()),
            check_out_time: time_out.map(str::to_string),
        }
    }

    fn keys() -> HashMap<i64, i64> {
        [(1, 10)].into_iter().collect()
    }

    #[test]
    fn test_time_key_buckets() {
        assert_eq!(time_key(at(9, 37), TimeBucket::QuarterHour), 930);
        assert_eq!(time_key(at(9, 0), TimeBucket::QuarterHour), 900);
        assert_eq!(time_key(at(23, 59), TimeBucket::QuarterHour), 2345);
        assert_eq!(time_key(at(9, 37), TimeBucket::Hour), 900);
        assert_eq!(time_key(at(0, 14), TimeBucket::QuarterHour), 0);
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes(at(9, 0), at(9, 45)), (45, false));
        assert_eq!(duration_minutes(at(9, 0), at(8, 30)), (0, true));
    }

    #[test]
    fn test_plan_new_visit() {
        let source = vec![check_in(5, 1, "2026-10-12T09:00:00", Some("2026-10-12T09:45:00"))];
        let plan = plan(&source, &HashMap::new(), &keys(), TimeBucket::QuarterHour, at(12, 0));

        assert_eq!(plan.inserts.len(), 1);
        let fact = &plan.inserts[0];
        assert_eq!(fact.visit_key, "5_20261012");
        assert_eq!(fact.date_key, 20261012);
        assert_eq!(fact.time_key, 900);
        assert_eq!(fact.member_key, 10);
        assert_eq!(fact.duration_minutes, Some(45));
    }

    #[test]
    fn test_plan_open_visit_has_no_duration() {
        let source = vec![check_in(6, 1, "2026-10-12 18:20:00", None)];
        let plan = plan(&source, &HashMap::new(), &keys(), TimeBucket::QuarterHour, at(19, 0));
        assert_eq!(plan.inserts[0].duration_minutes, None);
        assert_eq!(plan.inserts[0].check_out_time, None);
        assert_eq!(plan.inserts[0].time_key, 1815);
    }

    #[test]
    fn test_plan_completes_open_visit() {
        let source = vec![check_in(6, 1, "2026-10-12T18:20:00", Some("2026-10-12T19:30:00"))];
        let loaded: HashMap<String, LoadedVisitKey> = [(
            "6_20261012".to_string(),
            LoadedVisitKey {
                visit_key: "6_20261012".to_string(),
                check_out_time: None,
            },
        )]
        .into_iter()
        .collect();

        let plan = plan(&source, &loaded, &keys(), TimeBucket::QuarterHour, at(20, 0));
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.completions.len(), 1);
        assert_eq!(plan.completions[0].duration_minutes, 70);
    }

    #[test]
    fn test_plan_skips_bad_rows() {
        let source = vec![
            check_in(7, 1, "garbage", None),
            check_in(8, 99, "2026-10-12T10:00:00", None),
            check_in(9, 1, "2026-10-12T10:00:00", Some("2026-10-12T09:00:00")),
        ];
        let plan = plan(&source, &HashMap::new(), &keys(), TimeBucket::Hour, at(12, 0));

        assert_eq!(plan.invalid_time, vec![7]);
        assert_eq!(plan.missing_member, vec![8]);
        assert_eq!(plan.skipped(), 2);
        assert_eq!(plan.negative_duration, vec![9]);
        assert_eq!(plan.inserts[0].duration_minutes, Some(0));
    }
}
