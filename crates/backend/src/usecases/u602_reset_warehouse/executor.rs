use contracts::usecases::u602_reset_warehouse::{ResetTableResult, ResetWarehouseResponse};

use crate::shared::data::Filter;
use crate::shared::etl_context::EtlContext;

/// Очистить таблицы хранилища (служебная операция, вне ETL)
///
/// PostgREST не удаляет без фильтра, поэтому строки отбираются по
/// непустому ключу. Журнал прогонов не трогается.
pub async fn reset_warehouse(ctx: &EtlContext) -> ResetWarehouseResponse {
    let mut results = Vec::new();

    for (table, key_column) in ctx.tables.warehouse_tables() {
        let result = ctx
            .warehouse
            .delete(table, &Filter::all().not_null(key_column))
            .await;

        match result {
            Ok(()) => {
                tracing::info!("Warehouse table {} cleared", table);
                results.push(ResetTableResult {
                    table: table.to_string(),
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                tracing::error!("Failed to clear {}: {}", table, e);
                results.push(ResetTableResult {
                    table: table.to_string(),
                    success: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    ResetWarehouseResponse { tables: results }
}
