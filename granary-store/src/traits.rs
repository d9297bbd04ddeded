// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the document-database collaborator.

use std::fmt::{Debug, Display};
use std::future::Future;

use granary_core::{Field, FieldId, PrincipalId, Profile, ShareToken, TokenId, Weighing, WeighingId};

use crate::Snapshots;

/// Interface for storing, querying and deleting share tokens.
///
/// Tokens are write-once documents keyed by their random id; redemption
/// deletes them as the final step of a successful or rejected attempt.
pub trait TokenStore: Clone + Send + Sync {
    type Error: Display + Debug + Send;

    /// Write a token document.
    fn insert_token(
        &self,
        id: &TokenId,
        token: &ShareToken,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Get a token document.
    fn token(
        &self,
        id: &TokenId,
    ) -> impl Future<Output = Result<Option<ShareToken>, Self::Error>> + Send;

    /// Delete a token document.
    ///
    /// Returns `true` when the removal occurred and `false` when the token
    /// was not found in the store.
    fn delete_token(&self, id: &TokenId) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// Interface for field documents, their access-control lists and the live
/// queries over them.
///
/// Fields live in per-owner collections and are addressed by
/// `(owner, field id)`. Access-list mutations have set semantics and are
/// idempotent; the `_many` variants are applied as a single atomic batch.
pub trait FieldStore: Clone + Send + Sync {
    type Error: Display + Debug + Send;

    /// Get a field document.
    fn field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
    ) -> impl Future<Output = Result<Option<Field>, Self::Error>> + Send;

    /// Write a field document, replacing any previous body.
    fn insert_field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        field: &Field,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Update the owner-editable metadata of an existing field.
    fn update_field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        name: &str,
        crop: &str,
        size: f64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Delete a field document together with its weighing sub-collection.
    ///
    /// Returns `true` when the removal occurred and `false` when the field
    /// was not found in the store.
    fn delete_field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// All fields of one owner.
    fn owner_fields(
        &self,
        owner: &PrincipalId,
    ) -> impl Future<Output = Result<Vec<(FieldId, Field)>, Self::Error>> + Send;

    /// Cross-owner query: every field whose access-control list contains
    /// `principal`, regardless of owner.
    fn fields_shared_with(
        &self,
        principal: &PrincipalId,
    ) -> impl Future<Output = Result<Vec<(FieldId, Field)>, Self::Error>> + Send;

    /// Add `principal` to one field's access-control list (set union).
    ///
    /// Returns `true` when the list changed and `false` when the principal
    /// was already present.
    fn grant_access(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        principal: &PrincipalId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Remove `principal` from one field's access-control list (set
    /// difference). Revoking absent access is a silent success.
    fn revoke_access(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        principal: &PrincipalId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Add `principal` to several fields' access-control lists in one atomic
    /// batch: either every target is applied or none is.
    ///
    /// Returns how many lists actually changed.
    fn grant_access_many(
        &self,
        owner: &PrincipalId,
        ids: &[FieldId],
        principal: &PrincipalId,
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;

    /// Remove `principal` from several fields' access-control lists in one
    /// atomic batch.
    ///
    /// Returns how many lists actually changed.
    fn revoke_access_many(
        &self,
        owner: &PrincipalId,
        ids: &[FieldId],
        principal: &PrincipalId,
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;

    /// Subscribe to the result of [`FieldStore::owner_fields`].
    fn watch_owner_fields(
        &self,
        owner: &PrincipalId,
    ) -> impl Future<Output = Result<Snapshots<Vec<(FieldId, Field)>>, Self::Error>> + Send;

    /// Subscribe to the result of [`FieldStore::fields_shared_with`].
    fn watch_shared_with(
        &self,
        principal: &PrincipalId,
    ) -> impl Future<Output = Result<Snapshots<Vec<(FieldId, Field)>>, Self::Error>> + Send;
}

/// Interface for the per-field weighing sub-collection.
///
/// Weighings are normalized into their own documents so that creation,
/// finalization and deletion are per-document updates rather than
/// read-modify-write cycles on an embedded array.
pub trait WeighingStore: Clone + Send + Sync {
    type Error: Display + Debug + Send;

    /// All weighings of one field, in creation order.
    fn weighings(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
    ) -> impl Future<Output = Result<Vec<(WeighingId, Weighing)>, Self::Error>> + Send;

    /// Get a single weighing document.
    fn weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
    ) -> impl Future<Output = Result<Option<Weighing>, Self::Error>> + Send;

    /// Append a weighing, returning its generated id.
    fn add_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        weighing: &Weighing,
    ) -> impl Future<Output = Result<WeighingId, Self::Error>> + Send;

    /// Replace the body of an existing weighing.
    fn update_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
        weighing: &Weighing,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Set the empty weight of an existing weighing, finalizing it.
    fn finalize_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
        empty: f64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Delete a weighing.
    ///
    /// Returns `true` when the removal occurred and `false` when the
    /// weighing was not found in the store.
    fn delete_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Subscribe to the result of [`WeighingStore::weighings`].
    fn watch_weighings(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
    ) -> impl Future<Output = Result<Snapshots<Vec<(WeighingId, Weighing)>>, Self::Error>> + Send;
}

/// Interface for principal profile documents.
pub trait ProfileStore: Clone + Send + Sync {
    type Error: Display + Debug + Send;

    /// Get a profile document; `None` when the principal does not resolve.
    fn profile(
        &self,
        principal: &PrincipalId,
    ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send;

    /// Write a profile document.
    fn insert_profile(
        &self,
        principal: &PrincipalId,
        profile: &Profile,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Interface for the per-owner directory of known trailer names.
pub trait TrailerDirectory: Clone + Send + Sync {
    type Error: Display + Debug + Send;

    /// All trailer names recorded by one owner, sorted.
    fn trailer_names(
        &self,
        owner: &PrincipalId,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

    /// Record a trailer name. Adding a known name is a silent no-op.
    fn add_trailer_name(
        &self,
        owner: &PrincipalId,
        name: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
