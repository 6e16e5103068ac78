use contracts::domain::a103_payment::aggregate::Payment;

use crate::shared::data::{decode_rows, Decoded, Filter, StoreError};
use crate::shared::etl_context::EtlContext;

/// Снимок всех платежей
pub async fn list_all(ctx: &EtlContext) -> Result<Decoded<Payment>, StoreError> {
    let rows = ctx
        .operational
        .read(&ctx.tables.payments, &Filter::all())
        .await?;
    Ok(decode_rows(&ctx.tables.payments, rows))
}
