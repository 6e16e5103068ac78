use super::{projection_builder, repository};
use contracts::usecases::u601_run_etl::LoadStats;

use crate::domain::a102_check_in;
use crate::projections::p600_dim_member;
use crate::shared::etl_context::EtlContext;
use crate::shared::etl_error::EtlError;

/// Инкрементальная загрузка `fact_visits` из отметок входа/выхода
pub async fn load(ctx: &EtlContext) -> Result<LoadStats, EtlError> {
    let check_ins = a102_check_in::repository::list_all(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.check_ins, e))?;
    let loaded = repository::loaded_keys(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.fact_visits, e))?;
    let member_keys = p600_dim_member::repository::current_keys_by_member(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.dim_member, e))?;

    let plan = projection_builder::plan(
        &check_ins.items,
        &loaded,
        &member_keys,
        ctx.settings.time_bucket,
        ctx.clock.now(),
    );

    for check_in_id in &plan.invalid_time {
        tracing::warn!("Check-in {} skipped: no valid check_in_time", check_in_id);
    }
    for check_in_id in &plan.missing_member {
        tracing::warn!(
            "Check-in {} skipped: member has no current row in {}",
            check_in_id,
            ctx.tables.dim_member
        );
    }
    for check_in_id in &plan.negative_duration {
        tracing::warn!(
            "Check-in {}: check-out before check-in, duration set to 0",
            check_in_id
        );
    }

    let mut stats = LoadStats {
        unchanged: plan.unchanged,
        skipped: check_ins.rejected + plan.skipped(),
        ..Default::default()
    };

    for fact in &plan.inserts {
        match repository::insert_fact(ctx, fact).await {
            Ok(()) => stats.inserted += 1,
            Err(e) => {
                tracing::error!("Failed to insert visit {}: {}", fact.visit_key, e);
                stats.failed += 1;
            }
        }
    }

    for completion in &plan.completions {
        match repository::complete_visit(
            ctx,
            &completion.visit_key,
            completion.check_out_time,
            completion.duration_minutes,
        )
        .await
        {
            Ok(()) => stats.updated += 1,
            Err(e) => {
                tracing::error!("Failed to complete visit {}: {}", completion.visit_key, e);
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        "{}: {} inserted, {} completed, {} unchanged, {} skipped, {} failed",
        ctx.tables.fact_visits,
        stats.inserted,
        stats.updated,
        stats.unchanged,
        stats.skipped,
        stats.failed
    );

    Ok(stats)
}
