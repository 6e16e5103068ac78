use super::{projection_builder, repository};
use contracts::usecases::u601_run_etl::LoadStats;
use std::collections::HashMap;

use crate::domain::{a103_payment, a104_membership};
use crate::projections::p600_dim_member;
use crate::shared::etl_context::EtlContext;
use crate::shared::etl_error::EtlError;

/// Инкрементальная загрузка `fact_revenue` из платежей
pub async fn load(ctx: &EtlContext) -> Result<LoadStats, EtlError> {
    let payments = a103_payment::repository::list_all(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.payments, e))?;
    let loaded = repository::loaded_keys(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.fact_revenue, e))?;
    let member_keys = p600_dim_member::repository::current_keys_by_member(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.dim_member, e))?;

    // Тип абонемента необязателен: без него факты всё равно грузятся
    let membership_types = match a104_membership::repository::type_names_by_membership(ctx).await {
        Ok(types) => types,
        Err(e) => {
            tracing::warn!("Membership types unavailable, loading revenue without them: {}", e);
            HashMap::new()
        }
    };

    let plan = projection_builder::plan(
        &payments.items,
        &loaded,
        &member_keys,
        &membership_types,
        ctx.clock.now(),
    );

    for payment_id in &plan.invalid_time {
        tracing::warn!("Payment {} skipped: no valid payment_date", payment_id);
    }
    for payment_id in &plan.missing_amount {
        tracing::warn!("Payment {} skipped: no amount", payment_id);
    }
    for payment_id in &plan.missing_member {
        tracing::warn!(
            "Payment {} skipped: member has no current row in {}",
            payment_id,
            ctx.tables.dim_member
        );
    }

    let mut stats = LoadStats {
        unchanged: plan.unchanged,
        skipped: payments.rejected + plan.skipped(),
        ..Default::default()
    };

    for fact in &plan.inserts {
        match repository::insert_fact(ctx, fact).await {
            Ok(()) => stats.inserted += 1,
            Err(e) => {
                tracing::error!("Failed to insert revenue {}: {}", fact.revenue_key, e);
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        "{}: {} inserted, {} unchanged, {} skipped, {} failed",
        ctx.tables.fact_revenue,
        stats.inserted,
        stats.unchanged,
        stats.skipped,
        stats.failed
    );

    Ok(stats)
}
