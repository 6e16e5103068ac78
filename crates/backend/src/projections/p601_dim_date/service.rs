use super::projection_builder::{self, DateWindow};
use super::repository;
use contracts::usecases::u601_run_etl::LoadStats;

use crate::shared::etl_context::EtlContext;
use crate::shared::etl_error::EtlError;

/// Дозаполнить `dim_date` днями окна вокруг сегодняшней даты
pub async fn load(ctx: &EtlContext, days_back: i64, days_forward: i64) -> Result<LoadStats, EtlError> {
    let window = DateWindow::around(ctx.clock.today(), days_back, days_forward)?;

    let existing = repository::existing_keys(ctx)
        .await
        .map_err(|e| EtlError::read(&ctx.tables.dim_date, e))?;
    let missing = projection_builder::missing_days(&window, &existing);

    let mut stats = LoadStats {
        unchanged: window.len() - missing.len(),
        ..Default::default()
    };

    for record in &missing {
        match repository::insert_day(ctx, record).await {
            Ok(()) => stats.inserted += 1,
            Err(e) => {
                tracing::error!("Failed to insert date {}: {}", record.date_key, e);
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        "{}: window {}..{}, {} inserted, {} already present, {} failed",
        ctx.tables.dim_date,
        window.first,
        window.last,
        stats.inserted,
        stats.unchanged,
        stats.failed
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::memory_store::StoreOp;
    use crate::shared::test_support::{at, day, field, memory_ctx};
    use serde_json::json;

    #[tokio::test]
    async fn test_generation_is_idempotent() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));

        let first = load(&ctx, 365, 180).await.unwrap();
        assert_eq!(first.inserted, 546);
        let second = load(&ctx, 365, 180).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.unchanged, 546);
        assert_eq!(store.rows("dim_date").len(), 546);
    }

    #[tokio::test]
    async fn test_moving_window_adds_only_new_days() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));
        load(&ctx, 3, 3).await.unwrap();

        let stats = load(&at(&ctx, day(2026, 10, 19)), 3, 3).await.unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(store.rows("dim_date").len(), 9);
    }

    #[tokio::test]
    async fn test_row_shape() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));
        load(&ctx, 0, 0).await.unwrap();

        let rows = store.rows("dim_date");
        assert_eq!(field(&rows[0], "date_key"), &json!(20261017));
        assert_eq!(field(&rows[0], "full_date"), &json!("2026-10-17"));
        assert_eq!(field(&rows[0], "is_weekend"), &json!(true));
    }

    #[tokio::test]
    async fn test_insert_failures_are_counted() {
        let (store, ctx) = memory_ctx(day(2026, 10, 17));
        store.fail_on(StoreOp::Insert, "dim_date");

        let stats = load(&ctx, 1, 1).await.unwrap();
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.inserted, 0);
    }

    #[tokio::test]
    async fn test_invalid_window() {
        let (_store, ctx) = memory_ctx(day(2026, 10, 17));
        assert!(matches!(
            load(&ctx, -5, 10).await,
            Err(EtlError::InvalidWindow(_))
        ));
    }
}
