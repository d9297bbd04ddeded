// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for exercising failure paths in consumers of the store traits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use granary_core::{Field, FieldId, PrincipalId, Profile, ShareToken, TokenId, Weighing, WeighingId};

use crate::traits::{FieldStore, ProfileStore, TokenStore, TrailerDirectory, WeighingStore};
use crate::{MemoryStore, Snapshots, StoreError};

/// A [`MemoryStore`] wrapper with a trip switch: while tripped, every
/// operation fails with a synthetic backend error and nothing is applied.
///
/// Used to assert that consumers surface backend failures distinctly from
/// domain outcomes and leave state untouched.
#[derive(Clone, Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the wrapped store, bypassing the trip switch.
    pub fn store(&self) -> &MemoryStore {
        &self.inner
    }

    /// Make every following operation fail until [`FlakyStore::recover`].
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Let operations through again.
    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl TokenStore for FlakyStore {
    type Error = StoreError;

    async fn insert_token(&self, id: &TokenId, token: &ShareToken) -> Result<(), Self::Error> {
        self.guard()?;
        self.inner.insert_token(id, token).await
    }

    async fn token(&self, id: &TokenId) -> Result<Option<ShareToken>, Self::Error> {
        self.guard()?;
        self.inner.token(id).await
    }

    async fn delete_token(&self, id: &TokenId) -> Result<bool, Self::Error> {
        self.guard()?;
        self.inner.delete_token(id).await
    }
}

impl FieldStore for FlakyStore {
    type Error = StoreError;

    async fn field(&self, owner: &PrincipalId, id: &FieldId) -> Result<Option<Field>, Self::Error> {
        self.guard()?;
        self.inner.field(owner, id).await
    }

    async fn insert_field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        field: &Field,
    ) -> Result<(), Self::Error> {
        self.guard()?;
        self.inner.insert_field(owner, id, field).await
    }

    async fn update_field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        name: &str,
        crop: &str,
        size: f64,
    ) -> Result<(), Self::Error> {
        self.guard()?;
        self.inner.update_field(owner, id, name, crop, size).await
    }

    async fn delete_field(&self, owner: &PrincipalId, id: &FieldId) -> Result<bool, Self::Error> {
        self.guard()?;
        self.inner.delete_field(owner, id).await
    }

    async fn owner_fields(&self, owner: &PrincipalId) -> Result<Vec<(FieldId, Field)>, Self::Error> {
        self.guard()?;
        self.inner.owner_fields(owner).await
    }

    async fn fields_shared_with(
        &self,
        principal: &PrincipalId,
    ) -> Result<Vec<(FieldId, Field)>, Self::Error> {
        self.guard()?;
        self.inner.fields_shared_with(principal).await
    }

    async fn grant_access(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        principal: &PrincipalId,
    ) -> Result<bool, Self::Error> {
        self.guard()?;
        self.inner.grant_access(owner, id, principal).await
    }

    async fn revoke_access(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        principal: &PrincipalId,
    ) -> Result<bool, Self::Error> {
        self.guard()?;
        self.inner.revoke_access(owner, id, principal).await
    }

    async fn grant_access_many(
        &self,
        owner: &PrincipalId,
        ids: &[FieldId],
        principal: &PrincipalId,
    ) -> Result<usize, Self::Error> {
        self.guard()?;
        self.inner.grant_access_many(owner, ids, principal).await
    }

    async fn revoke_access_many(
        &self,
        owner: &PrincipalId,
        ids: &[FieldId],
        principal: &PrincipalId,
    ) -> Result<usize, Self::Error> {
        self.guard()?;
        self.inner.revoke_access_many(owner, ids, principal).await
    }

    async fn watch_owner_fields(
        &self,
        owner: &PrincipalId,
    ) -> Result<Snapshots<Vec<(FieldId, Field)>>, Self::Error> {
        self.guard()?;
        self.inner.watch_owner_fields(owner).await
    }

    async fn watch_shared_with(
        &self,
        principal: &PrincipalId,
    ) -> Result<Snapshots<Vec<(FieldId, Field)>>, Self::Error> {
        self.guard()?;
        self.inner.watch_shared_with(principal).await
    }
}

impl WeighingStore for FlakyStore {
    type Error = StoreError;

    async fn weighings(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
    ) -> Result<Vec<(WeighingId, Weighing)>, Self::Error> {
        self.guard()?;
        self.inner.weighings(owner, field).await
    }

    async fn weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
    ) -> Result<Option<Weighing>, Self::Error> {
        self.guard()?;
        self.inner.weighing(owner, field, id).await
    }

    async fn add_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        weighing: &Weighing,
    ) -> Result<WeighingId, Self::Error> {
        self.guard()?;
        self.inner.add_weighing(owner, field, weighing).await
    }

    async fn update_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
        weighing: &Weighing,
    ) -> Result<(), Self::Error> {
        self.guard()?;
        self.inner.update_weighing(owner, field, id, weighing).await
    }

    async fn finalize_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
        empty: f64,
    ) -> Result<(), Self::Error> {
        self.guard()?;
        self.inner.finalize_weighing(owner, field, id, empty).await
    }

    async fn delete_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
    ) -> Result<bool, Self::Error> {
        self.guard()?;
        self.inner.delete_weighing(owner, field, id).await
    }

    async fn watch_weighings(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
    ) -> Result<Snapshots<Vec<(WeighingId, Weighing)>>, Self::Error> {
        self.guard()?;
        self.inner.watch_weighings(owner, field).await
    }
}

impl ProfileStore for FlakyStore {
    type Error = StoreError;

    async fn profile(&self, principal: &PrincipalId) -> Result<Option<Profile>, Self::Error> {
        self.guard()?;
        self.inner.profile(principal).await
    }

    async fn insert_profile(
        &self,
        principal: &PrincipalId,
        profile: &Profile,
    ) -> Result<(), Self::Error> {
        self.guard()?;
        self.inner.insert_profile(principal, profile).await
    }
}

impl TrailerDirectory for FlakyStore {
    type Error = StoreError;

    async fn trailer_names(&self, owner: &PrincipalId) -> Result<Vec<String>, Self::Error> {
        self.guard()?;
        self.inner.trailer_names(owner).await
    }

    async fn add_trailer_name(&self, owner: &PrincipalId, name: &str) -> Result<(), Self::Error> {
        self.guard()?;
        self.inner.add_trailer_name(owner, name).await
    }
}
