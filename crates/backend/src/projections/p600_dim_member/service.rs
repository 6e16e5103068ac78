use super::{projection_builder, repository};
use contracts::usecases::u601_run_etl::LoadStats;

use crate::domain::a101_member;
use crate::shared::etl_context::EtlContext;
use crate::shared::etl_error::EtlError;

/// Привести измерение `dim_member` к снимку операционных членов (SCD Type 2)
///
/// `inserted` это число членов, получивших новую текущую версию; `updated`
/// это число закрытых версий. Ошибки записи по отдельным членам не
/// прерывают загрузку.
pub async fn load(ctx: &EtlContext) -> Result<LoadStats, EtlError> {
    let today = ctx.clock.today();

    let members = a101_member::repository::list_all(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.members, e))?;
    let current = repository::list_current(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.dim_member, e))?;

    let plan = projection_builder::plan(
        &members.items,
        &current.records,
        &current.unreadable_members,
        today,
    );

    let mut stats = LoadStats {
        unchanged: plan.unchanged,
        skipped: members.rejected + plan.duplicate_source_rows,
        failed: plan.blocked.len(),
        invariant_violations: plan.invariant_violations.len(),
        ..Default::default()
    };

    for member_id in &plan.invariant_violations {
        tracing::warn!(
            "Invariant violation in {}: member {} has more than one current version",
            ctx.tables.dim_member,
            member_id
        );
    }
    for member_id in &plan.blocked {
        tracing::error!(
            "Member {} skipped: its current version in {} cannot be read or closed",
            member_id,
            ctx.tables.dim_member
        );
    }
    if current.orphan_rows > 0 {
        tracing::warn!(
            "{} current rows in {} have no member_id",
            current.orphan_rows,
            ctx.tables.dim_member
        );
    }

    for record in &plan.new_members {
        match repository::insert_version(ctx, record).await {
            Ok(()) => stats.inserted += 1,
            Err(e) => {
                tracing::error!("Failed to insert member {}: {}", record.member_id, e);
                stats.failed += 1;
            }
        }
    }

    for change in &plan.changed {
        let member_id = change.next.member_id;

        let mut closed = true;
        for member_key in &change.close_keys {
            match repository::close_version(ctx, *member_key, today).await {
                Ok(()) => stats.updated += 1,
                Err(e) => {
                    tracing::error!(
                        "Failed to close version {} of member {}: {}",
                        member_key,
                        member_id,
                        e
                    );
                    closed = false;
                    break;
                }
            }
        }
        // Без закрытия вставка дала бы вторую текущую версию
        if !closed {
            stats.failed += 1;
            continue;
        }

        match repository::insert_version(ctx, &change.next).await {
            Ok(()) => stats.inserted += 1,
            Err(e) => {
                tracing::error!(
                    "Member {} left without current version: insert failed after close: {}",
                    member_id,
                    e
                );
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        "{}: {} new versions, {} closed, {} unchanged, {} skipped, {} failed",
        ctx.tables.dim_member,
        stats.inserted,
        stats.updated,
        stats.unchanged,
        stats.skipped,
        stats.failed
    );

    Ok(stats)
}
