use chrono::NaiveDateTime;
use contracts::domain::a103_payment::aggregate::Payment;
use contracts::projections::p601_dim_date::dto::date_key;
use contracts::projections::p603_fact_revenue::dto::{revenue_key, RevenueFactRecord};
use std::collections::{HashMap, HashSet};

use crate::shared::dates::parse_datetime;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevenuePlan {
    pub inserts: Vec<RevenueFactRecord>,
    pub unchanged: usize,
    /// payment_id без разбираемой даты платежа
    pub invalid_time: Vec<i64>,
    /// payment_id без суммы
    pub missing_amount: Vec<i64>,
    pub missing_member: Vec<i64>,
}

impl RevenuePlan {
    pub fn skipped(&self) -> usize {
        self.invalid_time.len() + self.missing_amount.len() + self.missing_member.len()
    }
}

/// Спланировать инкрементальную загрузку выручки
///
/// Платёж неизменяем: загруженный `revenue_key` больше не трогается.
/// Тип абонемента подставляется, если он известен (`membership_types`).
pub fn plan(
    payments: &[Payment],
    loaded: &HashSet<String>,
    member_keys: &HashMap<i64, i64>,
    membership_types: &HashMap<i64, String>,
    loaded_at: NaiveDateTime,
) -> RevenuePlan {
    let mut plan = RevenuePlan::default();
    let mut seen = HashSet::new();

    for payment in payments {
        let Some(payment_time) = payment.payment_date.as_deref().and_then(parse_datetime) else {
            plan.invalid_time.push(payment.payment_id);
            continue;
        };

        let day_key = date_key(payment_time.date());
        let key = revenue_key(payment.payment_id, day_key);
        if loaded.contains(&key) || !seen.insert(key.clone()) {
            plan.unchanged += 1;
            continue;
        }

        let Some(amount) = payment.amount else {
            plan.missing_amount.push(payment.payment_id);
            continue;
        };
        let Some(member_key) = member_keys.get(&payment.member_id).copied() else {
            plan.missing_member.push(payment.payment_id);
            continue;
        };

        plan.inserts.push(RevenueFactRecord {
            revenue_key: key,
            payment_id: payment.payment_id,
            member_id: payment.member_id,
            member_key,
            date_key: day_key,
            amount,
            payment_type: payment.payment_type.clone(),
            membership_type: payment
                .membership_id
                .and_then(|id| membership_types.get(&id))
                .cloned(),
            payment_time,
            loaded_at,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn payment(id: i64, member_id: i64, amount: Option<f64>, date: &str) -> Payment {
        Payment {
            payment_id: id,
            member_id,
            amount,
            payment_type: Some("CARD".to_string()),
            payment_date: Some(date.to_string()),
            membership_id: Some(70),
        }
    }

    #[test]
    fn test_plan_builds_fact_with_membership_type() {
        let member_keys: HashMap<i64, i64> = [(1, 10)].into_iter().collect();
        let types: HashMap<i64, String> = [(70, "Monthly".to_string())].into_iter().collect();

        let plan = plan(
            &[payment(501, 1, Some(14990.0), "2026-10-03T17:22:00")],
            &HashSet::new(),
            &member_keys,
            &types,
            now(),
        );

        let fact = &plan.inserts[0];
        assert_eq!(fact.revenue_key, "501_20261003");
        assert_eq!(fact.date_key, 20261003);
        assert_eq!(fact.amount, 14990.0);
        assert_eq!(fact.member_key, 10);
        assert_eq!(fact.membership_type.as_deref(), Some("Monthly"));
    }

    #[test]
    fn test_plan_skips_loaded_and_bad_rows() {
        let member_keys: HashMap<i64, i64> = [(1, 10)].into_iter().collect();
        let loaded: HashSet<String> = ["1_20261001".to_string()].into_iter().collect();
        let payments = vec![
            payment(1, 1, Some(100.0), "2026-10-01"),
            payment(2, 1, None, "2026-10-01"),
            payment(3, 1, Some(100.0), "n/a"),
            payment(4, 8, Some(100.0), "2026-10-01"),
            payment(5, 1, Some(100.0), "2026-10-01"),
        ];

        let plan = plan(&payments, &loaded, &member_keys, &HashMap::new(), now());
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.missing_amount, vec![2]);
        assert_eq!(plan.invalid_time, vec![3]);
        assert_eq!(plan.missing_member, vec![4]);
        assert_eq!(plan.skipped(), 3);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].membership_type, None);
    }
}
