use chrono::NaiveDate;
use contracts::dashboards::d600_daily_stats::dto::DailyStats;
use std::collections::HashSet;

use crate::domain::{a101_member, a102_check_in, a104_membership};
use crate::shared::data::{Decoded, Filter, StoreError};
use crate::shared::dates::{parse_datetime, parse_opt_date};
use crate::shared::etl_context::EtlContext;

/// Недоступная таблица даёт пустой снимок и предупреждение
fn or_empty<T>(table: &str, result: Result<Decoded<T>, StoreError>) -> Vec<T> {
    match result {
        Ok(decoded) => decoded.items,
        Err(e) => {
            tracing::warn!("Daily stats: {} unavailable: {}", table, e);
            Vec::new()
        }
    }
}

fn is_on(raw: Option<&str>, today: NaiveDate) -> bool {
    raw.and_then(parse_datetime)
        .map(|dt| dt.date() == today)
        .unwrap_or(false)
}

/// Показатели панели на сегодня
pub async fn get_daily_stats(ctx: &EtlContext) -> DailyStats {
    let today = ctx.clock.today();

    let members = or_empty(
        &ctx.tables.members,
        a101_member::repository::list_all(ctx).await,
    );
    let check_ins = or_empty(
        &ctx.tables.check_ins,
        a102_check_in::repository::list_all(ctx).await,
    );
    let memberships = or_empty(
        &ctx.tables.memberships,
        a104_membership::repository::list_all(ctx).await,
    );

    let todays: Vec<_> = check_ins
        .iter()
        .filter(|c| is_on(c.check_in_time.as_deref(), today))
        .collect();
    let unique_visitors: HashSet<i64> = todays.iter().map(|c| c.member_id).collect();
    let currently_inside = todays
        .iter()
        .filter(|c| c.check_out_time.as_deref().and_then(parse_datetime).is_none())
        .count();

    let active_memberships = memberships
        .iter()
        .filter(|m| {
            let started = parse_opt_date(m.start_date.as_deref()).map_or(false, |d| d <= today);
            let not_ended = parse_opt_date(m.end_date.as_deref()).map_or(true, |d| d >= today);
            started && not_ended
        })
        .count();

    let dwh_records = match ctx.warehouse.read(&ctx.tables.dim_member, &Filter::all()).await {
        Ok(rows) => rows.len(),
        Err(e) => {
            tracing::warn!("Daily stats: {} unavailable: {}", ctx.tables.dim_member, e);
            0
        }
    };

    DailyStats {
        date: Some(today),
        total_members: members.len(),
        active_members: members.iter().filter(|m| m.is_active()).count(),
        today_visits: todays.len(),
        unique_visitors: unique_visitors.len(),
        currently_inside,
        dwh_records,
        active_memberships,
    }
}
