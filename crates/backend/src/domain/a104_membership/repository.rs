use contracts::domain::a104_membership::aggregate::{Membership, MembershipType};
use std::collections::HashMap;

use crate::shared::data::{decode_rows, Decoded, Filter, StoreError};
use crate::shared::etl_context::EtlContext;

pub async fn list_all(ctx: &EtlContext) -> Result<Decoded<Membership>, StoreError> {
    let rows = ctx
        .operational
        .read(&ctx.tables.memberships, &Filter::all())
        .await?;
    Ok(decode_rows(&ctx.tables.memberships, rows))
}

pub async fn list_types(ctx: &EtlContext) -> Result<Decoded<MembershipType>, StoreError> {
    let rows = ctx
        .operational
        .read(&ctx.tables.membership_types, &Filter::all())
        .await?;
    Ok(decode_rows(&ctx.tables.membership_types, rows))
}

/// membership_id -> название типа абонемента
pub async fn type_names_by_membership(
    ctx: &EtlContext,
) -> Result<HashMap<i64, String>, StoreError> {
    let types: HashMap<i64, String> = list_types(ctx)
        .await?
        .items
        .into_iter()
        .map(|t| (t.type_id, t.type_name))
        .collect();

    Ok(list_all(ctx)
        .await?
        .items
        .into_iter()
        .filter_map(|m| {
            m.type_id
                .and_then(|type_id| types.get(&type_id))
                .map(|name| (m.membership_id, name.clone()))
        })
        .collect())
}
