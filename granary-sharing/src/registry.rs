// SPDX-License-Identifier: MIT OR Apache-2.0

//! The owner's access registry: who has access to which fields.

use std::collections::BTreeMap;

use granary_core::{Field, FieldId, PrincipalId};
use granary_store::{FieldStore, ProfileStore};
use tracing::{debug, warn};

use crate::SharingError;

/// Placeholder for grantees whose profile no longer resolves.
pub const UNKNOWN_USER: &str = "Unknown user";

/// One grantee's entry in the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct GranteeShares {
    /// Resolved display name, or [`UNKNOWN_USER`].
    pub name: String,

    /// The owner's fields this grantee currently has access to.
    pub fields: Vec<(FieldId, Field)>,
}

/// Group the owner's fields by grantee.
///
/// This is a read-time join over the per-field access-control lists, which
/// remain the single source of truth; no registry table is persisted. A
/// grantee whose profile fails to resolve is still listed, under a
/// placeholder name.
pub async fn list_grantees<S>(
    store: &S,
    owner: &PrincipalId,
) -> Result<BTreeMap<PrincipalId, GranteeShares>, SharingError>
where
    S: FieldStore + ProfileStore,
{
    let fields = store
        .owner_fields(owner)
        .await
        .map_err(SharingError::backend)?;

    let mut by_grantee: BTreeMap<PrincipalId, Vec<(FieldId, Field)>> = BTreeMap::new();
    for (id, field) in fields {
        for grantee in &field.access_control {
            by_grantee
                .entry(grantee.clone())
                .or_default()
                .push((id.clone(), field.clone()));
        }
    }

    let mut registry = BTreeMap::new();
    for (grantee, fields) in by_grantee {
        let name = match store.profile(&grantee).await {
            Ok(Some(profile)) => profile.name,
            Ok(None) => UNKNOWN_USER.to_string(),
            Err(error) => {
                warn!(grantee = %grantee, %error, "profile lookup failed, using placeholder");
                UNKNOWN_USER.to_string()
            }
        };
        registry.insert(grantee, GranteeShares { name, fields });
    }

    Ok(registry)
}

/// Revoke one grantee's access to one field.
///
/// Revoking absent access is a silent success.
pub async fn revoke_single<S>(
    store: &S,
    owner: &PrincipalId,
    field: &FieldId,
    grantee: &PrincipalId,
) -> Result<(), SharingError>
where
    S: FieldStore,
{
    store
        .revoke_access(owner, field, grantee)
        .await
        .map_err(SharingError::backend)?;
    debug!(owner = %owner, field = %field, grantee = %grantee, "access revoked");
    Ok(())
}

/// Revoke one grantee's access to every field of `owner` listing them, as a
/// single batch.
///
/// Purely a bulk convenience: the end state is identical to calling
/// [`revoke_single`] for each affected field in any order. Returns how many
/// fields were affected.
pub async fn revoke_all<S>(
    store: &S,
    owner: &PrincipalId,
    grantee: &PrincipalId,
) -> Result<usize, SharingError>
where
    S: FieldStore,
{
    let fields = store
        .owner_fields(owner)
        .await
        .map_err(SharingError::backend)?;
    let affected: Vec<FieldId> = fields
        .into_iter()
        .filter(|(_, field)| field.is_shared_with(grantee))
        .map(|(id, _)| id)
        .collect();

    if affected.is_empty() {
        return Ok(0);
    }

    let revoked = store
        .revoke_access_many(owner, &affected, grantee)
        .await
        .map_err(SharingError::backend)?;
    debug!(owner = %owner, grantee = %grantee, revoked, "bulk revocation applied");
    Ok(revoked)
}
