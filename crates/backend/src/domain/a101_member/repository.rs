use contracts::domain::a101_member::aggregate::Member;

use crate::shared::data::{decode_rows, Decoded, Filter, StoreError};
use crate::shared::etl_context::EtlContext;

/// Снимок всех членов клуба
pub async fn list_all(ctx: &EtlContext) -> Result<Decoded<Member>, StoreError> {
    let rows = ctx
        .operational
        .read(&ctx.tables.members, &Filter::all())
        .await?;
    Ok(decode_rows(&ctx.tables.members, rows))
}
