use chrono::NaiveDate;
use contracts::domain::a101_member::aggregate::Member;
use contracts::projections::p600_dim_member::dto::{
    open_version_valid_to, AgeGroup, MemberDimensionRecord,
};
use std::collections::{HashMap, HashSet};

use crate::shared::dates::{parse_opt_date, whole_years_between};

/// Возрастная группа на дату `today`. Нет даты, мусор или дата из будущего дают `Unknown`.
pub fn age_group(birth_date: Option<&str>, today: NaiveDate) -> AgeGroup {
    parse_opt_date(birth_date)
        .and_then(|birth| whole_years_between(birth, today))
        .map(AgeGroup::from_age)
        .unwrap_or(AgeGroup::Unknown)
}

/// Полных дней членства на `today`; без даты вступления 0
pub fn member_since_days(join_date: Option<&str>, today: NaiveDate) -> i64 {
    parse_opt_date(join_date)
        .map(|joined| (today - joined).num_days().max(0))
        .unwrap_or(0)
}

/// Новая открытая версия члена клуба
pub fn build_version(member: &Member, today: NaiveDate) -> MemberDimensionRecord {
    MemberDimensionRecord {
        member_key: None,
        member_id: member.member_id,
        first_name: member.first_name.clone(),
        last_name: member.last_name.clone(),
        email: member.email.clone(),
        member_status: member.status.code().to_string(),
        age_group: age_group(member.birth_date.as_deref(), today),
        member_since_days: member_since_days(member.join_date.as_deref(), today),
        valid_from: today,
        valid_to: open_version_valid_to(),
        is_current: true,
    }
}

/// Смена версии: закрыть текущие строки и вставить новую
#[derive(Debug, Clone, PartialEq)]
pub struct VersionChange {
    pub close_keys: Vec<i64>,
    pub next: MemberDimensionRecord,
}

/// Минимальный набор записей, приводящий измерение к снимку источника
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionPlan {
    /// Члены без текущей версии: просто вставка
    pub new_members: Vec<MemberDimensionRecord>,
    /// Члены с изменёнными отслеживаемыми атрибутами
    pub changed: Vec<VersionChange>,
    pub unchanged: usize,
    /// member_id с несколькими текущими версиями
    pub invariant_violations: Vec<i64>,
    /// Повторы member_id в снимке источника (берётся первый)
    pub duplicate_source_rows: usize,
    /// Члены, чью текущую версию нельзя прочитать или закрыть: не трогаем
    pub blocked: Vec<i64>,
}

/// Самая свежая из текущих версий
fn latest<'a>(versions: &[&'a MemberDimensionRecord]) -> Option<&'a MemberDimensionRecord> {
    versions
        .iter()
        .copied()
        .max_by_key(|v| (v.valid_from, v.member_key.unwrap_or(i64::MIN)))
}

/// Спланировать SCD2-обновление измерения
///
/// `blocked` это члены, у которых в измерении есть текущая строка, которую
/// не удалось разобрать: для них ничего не пишется, иначе появилась бы
/// вторая текущая версия.
pub fn plan(
    members: &[Member],
    current: &[MemberDimensionRecord],
    blocked: &HashSet<i64>,
    today: NaiveDate,
) -> DimensionPlan {
    let mut by_member: HashMap<i64, Vec<&MemberDimensionRecord>> = HashMap::new();
    for version in current.iter().filter(|v| v.is_current) {
        by_member.entry(version.member_id).or_default().push(version);
    }

    let mut plan = DimensionPlan::default();

    let mut violations: Vec<i64> = by_member
        .iter()
        .filter(|(_, versions)| versions.len() > 1)
        .map(|(member_id, _)| *member_id)
        .collect();
    violations.sort_unstable();
    plan.invariant_violations = violations;

    let mut seen = HashSet::new();
    for member in members {
        if !seen.insert(member.member_id) {
            plan.duplicate_source_rows += 1;
            continue;
        }
        if blocked.contains(&member.member_id) {
            plan.blocked.push(member.member_id);
            continue;
        }

        let candidate = build_version(member, today);
        let versions = by_member
            .get(&member.member_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match latest(versions) {
            None => plan.new_members.push(candidate),
            Some(existing) if existing.same_tracked_attributes(&candidate) => {
                plan.unchanged += 1;
            }
            Some(_) => {
                let close_keys: Vec<i64> = versions.iter().filter_map(|v| v.member_key).collect();
                if close_keys.len() != versions.len() {
                    // Строку без суррогатного ключа не закрыть
                    plan.blocked.push(member.member_id);
                    continue;
                }
                plan.changed.push(VersionChange {
                    close_keys,
                    next: candidate,
                });
            }
        }
    }

    plan
}
