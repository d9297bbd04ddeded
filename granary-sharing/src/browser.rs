// SPDX-License-Identifier: MIT OR Apache-2.0

//! The grantee's view: fields other owners have shared with them.

use granary_core::{Field, FieldId, PrincipalId};
use granary_store::{FieldStore, ProfileStore, Snapshots};
use tracing::warn;

use crate::SharingError;

/// Placeholder for owners whose profile no longer resolves.
pub const UNKNOWN_OWNER: &str = "Unknown owner";

/// A field shared with the current principal, enriched with its owner's
/// display name.
#[derive(Clone, Debug, PartialEq)]
pub struct SharedField {
    pub id: FieldId,
    pub owner_name: String,
    pub field: Field,
}

async fn resolve<S>(store: &S, fields: Vec<(FieldId, Field)>) -> Vec<SharedField>
where
    S: ProfileStore,
{
    let mut resolved = Vec::with_capacity(fields.len());
    for (id, field) in fields {
        // Owner names resolve independently per field so one failure never
        // empties the whole list.
        let owner_name = match store.profile(&field.owner_id).await {
            Ok(Some(profile)) => profile.name,
            Ok(None) => UNKNOWN_OWNER.to_string(),
            Err(error) => {
                warn!(owner = %field.owner_id, %error, "owner lookup failed, using placeholder");
                UNKNOWN_OWNER.to_string()
            }
        };
        resolved.push(SharedField {
            id,
            owner_name,
            field,
        });
    }
    resolved
}

/// One-shot query for every field whose access-control list contains
/// `principal`, across all owners.
pub async fn list_shared_with_me<S>(
    store: &S,
    principal: &PrincipalId,
) -> Result<Vec<SharedField>, SharingError>
where
    S: FieldStore + ProfileStore,
{
    let fields = store
        .fields_shared_with(principal)
        .await
        .map_err(SharingError::backend)?;
    Ok(resolve(store, fields).await)
}

/// Give up the principal's own access to one shared field.
///
/// Exactly a self-targeted [`revoke_single`](crate::revoke_single); no
/// other field the principal can access is affected.
pub async fn leave_share<S>(
    store: &S,
    principal: &PrincipalId,
    owner: &PrincipalId,
    field: &FieldId,
) -> Result<(), SharingError>
where
    S: FieldStore,
{
    store
        .revoke_access(owner, field, principal)
        .await
        .map_err(SharingError::backend)?;
    Ok(())
}

/// Live, crop-filterable view over the fields shared with one principal.
///
/// Owns its push subscription: dropping the view unsubscribes. The crop
/// filter only narrows what [`SharedFieldsView::visible`] returns, never
/// the underlying result set, and an empty selection shows everything.
#[derive(Debug)]
pub struct SharedFieldsView<S> {
    store: S,
    snapshots: Snapshots<Vec<(FieldId, Field)>>,
    selected_crops: Vec<String>,
    current: Vec<SharedField>,
}

impl<S> SharedFieldsView<S>
where
    S: FieldStore + ProfileStore,
{
    /// Subscribe and resolve the initial result.
    pub async fn open(store: S, principal: &PrincipalId) -> Result<Self, SharingError> {
        let snapshots = store
            .watch_shared_with(principal)
            .await
            .map_err(SharingError::backend)?;
        let current = resolve(&store, snapshots.current()).await;
        Ok(Self {
            store,
            snapshots,
            selected_crops: Vec::new(),
            current,
        })
    }

    /// Wait for the next pushed snapshot and re-resolve owner names.
    ///
    /// Returns `None` once the store side of the subscription is gone.
    pub async fn refreshed(&mut self) -> Option<&[SharedField]> {
        let fields = self.snapshots.changed().await?;
        self.current = resolve(&self.store, fields).await;
        Some(&self.current)
    }

    /// Every shared field of the current snapshot, unfiltered.
    pub fn all(&self) -> &[SharedField] {
        &self.current
    }

    /// Distinct crop labels of the current snapshot, sorted.
    pub fn crops(&self) -> Vec<String> {
        let mut crops: Vec<String> = self
            .current
            .iter()
            .map(|shared| shared.field.crop.clone())
            .filter(|crop| !crop.is_empty())
            .collect();
        crops.sort();
        crops.dedup();
        crops
    }

    pub fn selected_crops(&self) -> &[String] {
        &self.selected_crops
    }

    /// Toggle one crop label in the filter selection.
    pub fn toggle_crop(&mut self, crop: &str) {
        if let Some(position) = self.selected_crops.iter().position(|entry| entry == crop) {
            self.selected_crops.remove(position);
        } else {
            self.selected_crops.push(crop.to_string());
        }
    }

    /// Reset the filter to "show all".
    pub fn clear_crops(&mut self) {
        self.selected_crops.clear();
    }

    /// The rendered subset: filtered by the selected crops and sorted by
    /// field name.
    pub fn visible(&self) -> Vec<&SharedField> {
        let mut visible: Vec<&SharedField> = self
            .current
            .iter()
            .filter(|shared| {
                self.selected_crops.is_empty() || self.selected_crops.contains(&shared.field.crop)
            })
            .collect();
        visible.sort_by(|a, b| a.field.name.cmp(&b.field.name));
        visible
    }
}
