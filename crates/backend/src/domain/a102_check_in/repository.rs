use contracts::domain::a102_check_in::aggregate::CheckIn;

use crate::shared::data::{decode_rows, Decoded, Filter, StoreError};
use crate::shared::etl_context::EtlContext;

/// Снимок всех отметок посещения
pub async fn list_all(ctx: &EtlContext) -> Result<Decoded<CheckIn>, StoreError> {
    let rows = ctx
        .operational
        .read(&ctx.tables.check_ins, &Filter::all())
        .await?;
    Ok(decode_rows(&ctx.tables.check_ins, rows))
}
