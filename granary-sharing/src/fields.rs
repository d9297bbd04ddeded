// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field and weighing operations with their permission checks.
//!
//! The owner manages field metadata and deletion; the owner and any
//! principal on the access-control list may record, finalize, edit and
//! delete weighings. Input validation happens before any store call.

use granary_core::{Field, FieldId, PrincipalId, Timestamp, Weighing, WeighingId};
use granary_store::{FieldStore, TrailerDirectory, WeighingStore};
use tracing::debug;

use crate::SharingError;

fn require_positive(value: f64, what: &str) -> Result<(), SharingError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SharingError::InvalidInput(format!(
            "{what} must be a positive number"
        )))
    }
}

async fn require_contributor<S>(
    store: &S,
    actor: &PrincipalId,
    owner: &PrincipalId,
    field_id: &FieldId,
) -> Result<Field, SharingError>
where
    S: FieldStore,
{
    let field = store
        .field(owner, field_id)
        .await
        .map_err(SharingError::backend)?
        .ok_or_else(|| SharingError::UnknownField(field_id.clone()))?;
    if !field.can_contribute(actor) {
        return Err(SharingError::PermissionDenied(actor.clone()));
    }
    Ok(field)
}

/// Create a field owned by `owner`.
pub async fn create_field<S>(
    store: &S,
    owner: &PrincipalId,
    id: &FieldId,
    name: &str,
    crop: &str,
    size: f64,
) -> Result<(), SharingError>
where
    S: FieldStore,
{
    if name.trim().is_empty() || crop.trim().is_empty() {
        return Err(SharingError::InvalidInput(
            "name and crop are required".to_string(),
        ));
    }
    require_positive(size, "field size")?;

    let field = Field::new(name, crop, size, owner.clone());
    store
        .insert_field(owner, id, &field)
        .await
        .map_err(SharingError::backend)?;
    debug!(owner = %owner, field = %id, "field created");
    Ok(())
}

/// Update a field's owner-editable metadata.
pub async fn edit_field<S>(
    store: &S,
    owner: &PrincipalId,
    id: &FieldId,
    name: &str,
    crop: &str,
    size: f64,
) -> Result<(), SharingError>
where
    S: FieldStore,
{
    if name.trim().is_empty() || crop.trim().is_empty() {
        return Err(SharingError::InvalidInput(
            "name and crop are required".to_string(),
        ));
    }
    require_positive(size, "field size")?;

    store
        .update_field(owner, id, name, crop, size)
        .await
        .map_err(SharingError::backend)
}

/// Delete a field; the store cascades its weighing sub-collection.
pub async fn delete_field<S>(
    store: &S,
    owner: &PrincipalId,
    id: &FieldId,
) -> Result<bool, SharingError>
where
    S: FieldStore,
{
    let removed = store
        .delete_field(owner, id)
        .await
        .map_err(SharingError::backend)?;
    debug!(owner = %owner, field = %id, removed, "field deleted");
    Ok(removed)
}

/// Record a new trailer load with its full weight.
///
/// Allowed for the owner and any principal with access. The trailer name is
/// remembered in the owner's trailer directory for later suggestions.
pub async fn record_full_weighing<S>(
    store: &S,
    actor: &PrincipalId,
    owner: &PrincipalId,
    field_id: &FieldId,
    trailer_name: &str,
    full: f64,
    bale_count: Option<u32>,
    now: Timestamp,
) -> Result<WeighingId, SharingError>
where
    S: FieldStore + WeighingStore + TrailerDirectory,
{
    if trailer_name.trim().is_empty() {
        return Err(SharingError::InvalidInput(
            "a trailer name is required".to_string(),
        ));
    }
    require_positive(full, "full weight")?;
    require_contributor(store, actor, owner, field_id).await?;

    let mut weighing = Weighing::new(trailer_name, full, now);
    weighing.bale_count = bale_count;
    let id = store
        .add_weighing(owner, field_id, &weighing)
        .await
        .map_err(SharingError::backend)?;
    store
        .add_trailer_name(owner, trailer_name)
        .await
        .map_err(SharingError::backend)?;
    debug!(actor = %actor, field = %field_id, weighing = %id, "full weight recorded");
    Ok(id)
}

/// Finalize a weighing by recording its empty weight.
pub async fn finalize_weighing<S>(
    store: &S,
    actor: &PrincipalId,
    owner: &PrincipalId,
    field_id: &FieldId,
    id: &WeighingId,
    empty: f64,
) -> Result<(), SharingError>
where
    S: FieldStore + WeighingStore,
{
    require_positive(empty, "empty weight")?;
    require_contributor(store, actor, owner, field_id).await?;

    store
        .finalize_weighing(owner, field_id, id, empty)
        .await
        .map_err(SharingError::backend)?;
    debug!(actor = %actor, field = %field_id, weighing = %id, "weighing finalized");
    Ok(())
}

/// Correct the weights of an existing weighing.
///
/// Only the provided values are overwritten; non-positive corrections are
/// rejected before anything is written.
pub async fn edit_weighing<S>(
    store: &S,
    actor: &PrincipalId,
    owner: &PrincipalId,
    field_id: &FieldId,
    id: &WeighingId,
    full: Option<f64>,
    empty: Option<f64>,
) -> Result<(), SharingError>
where
    S: FieldStore + WeighingStore,
{
    if let Some(full) = full {
        require_positive(full, "full weight")?;
    }
    if let Some(empty) = empty {
        require_positive(empty, "empty weight")?;
    }
    require_contributor(store, actor, owner, field_id).await?;

    let mut weighing = store
        .weighing(owner, field_id, id)
        .await
        .map_err(SharingError::backend)?
        .ok_or_else(|| SharingError::InvalidInput(format!("unknown weighing: {id}")))?;
    if let Some(full) = full {
        weighing.full = full;
    }
    if let Some(empty) = empty {
        weighing.empty = Some(empty);
    }

    store
        .update_weighing(owner, field_id, id, &weighing)
        .await
        .map_err(SharingError::backend)
}

/// Delete a weighing.
pub async fn delete_weighing<S>(
    store: &S,
    actor: &PrincipalId,
    owner: &PrincipalId,
    field_id: &FieldId,
    id: &WeighingId,
) -> Result<bool, SharingError>
where
    S: FieldStore + WeighingStore,
{
    require_contributor(store, actor, owner, field_id).await?;
    store
        .delete_weighing(owner, field_id, id)
        .await
        .map_err(SharingError::backend)
}

#[cfg(test)]
mod tests {
    use granary_core::{FieldId, PrincipalId, totals};
    use granary_store::{FieldStore, MemoryStore, TrailerDirectory, WeighingStore};

    use super::{
        create_field, delete_weighing, edit_weighing, finalize_weighing, record_full_weighing,
    };
    use crate::SharingError;

    fn olive() -> PrincipalId {
        PrincipalId::from("olive")
    }

    fn gilles() -> PrincipalId {
        PrincipalId::from("gilles")
    }

    async fn store_with_field() -> (MemoryStore, FieldId) {
        let store = MemoryStore::new();
        let id = FieldId::from("north");
        create_field(&store, &olive(), &id, "North", "wheat", 10.0)
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn validation_happens_before_any_write() {
        let (store, id) = store_with_field().await;

        let result = record_full_weighing(
            &store, &olive(), &olive(), &id, "", 1000.0, None, 0,
        )
        .await;
        assert!(matches!(result, Err(SharingError::InvalidInput(_))));

        let result = record_full_weighing(
            &store, &olive(), &olive(), &id, "Red trailer", 0.0, None, 0,
        )
        .await;
        assert!(matches!(result, Err(SharingError::InvalidInput(_))));

        assert!(store.weighings(&olive(), &id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn contributors_need_access() {
        let (store, id) = store_with_field().await;

        let result = record_full_weighing(
            &store, &gilles(), &olive(), &id, "Red trailer", 1000.0, None, 0,
        )
        .await;
        assert_eq!(result, Err(SharingError::PermissionDenied(gilles())));

        store
            .grant_access(&olive(), &id, &gilles())
            .await
            .unwrap();
        record_full_weighing(
            &store, &gilles(), &olive(), &id, "Red trailer", 1000.0, None, 0,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn full_then_finalize_produces_totals() {
        let (store, id) = store_with_field().await;

        let first = record_full_weighing(
            &store, &olive(), &olive(), &id, "Red trailer", 1000.0, None, 0,
        )
        .await
        .unwrap();
        finalize_weighing(&store, &olive(), &olive(), &id, &first, 200.0)
            .await
            .unwrap();
        let second = record_full_weighing(
            &store, &olive(), &olive(), &id, "Blue trailer", 800.0, None, 0,
        )
        .await
        .unwrap();
        finalize_weighing(&store, &olive(), &olive(), &id, &second, 100.0)
            .await
            .unwrap();

        let weighings: Vec<_> = store
            .weighings(&olive(), &id)
            .await
            .unwrap()
            .into_iter()
            .map(|(_, weighing)| weighing)
            .collect();
        let totals = totals(10.0, &weighings);
        assert_eq!(totals.total_weight, 1500.0);
        assert_eq!(totals.yield_quintals, 1.5);
    }

    #[tokio::test]
    async fn trailer_names_are_remembered() {
        let (store, id) = store_with_field().await;

        record_full_weighing(
            &store, &olive(), &olive(), &id, "Red trailer", 1000.0, None, 0,
        )
        .await
        .unwrap();
        record_full_weighing(
            &store, &olive(), &olive(), &id, "Red trailer", 900.0, None, 0,
        )
        .await
        .unwrap();

        assert_eq!(
            store.trailer_names(&olive()).await.unwrap(),
            vec!["Red trailer"]
        );
    }

    #[tokio::test]
    async fn edits_only_overwrite_provided_weights() {
        let (store, id) = store_with_field().await;
        let weighing_id = record_full_weighing(
            &store, &olive(), &olive(), &id, "Red trailer", 1000.0, None, 0,
        )
        .await
        .unwrap();

        edit_weighing(
            &store,
            &olive(),
            &olive(),
            &id,
            &weighing_id,
            None,
            Some(150.0),
        )
        .await
        .unwrap();

        let weighing = store
            .weighing(&olive(), &id, &weighing_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(weighing.full, 1000.0);
        assert_eq!(weighing.empty, Some(150.0));

        assert!(
            delete_weighing(&store, &olive(), &olive(), &id, &weighing_id)
                .await
                .unwrap()
        );
    }
}
