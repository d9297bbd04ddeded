// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field records and their access-control list.

use serde::{Deserialize, Serialize};

use crate::PrincipalId;

/// A tracked harvest plot.
///
/// Fields live in a per-owner collection and are addressed by
/// `(owner id, field id)`; the document id itself is not part of the body.
/// The access-control list carries set semantics: grants and revocations go
/// through set-union / set-difference operations, never positional edits,
/// and the owner never appears in their own list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,

    /// Crop label, used for display and filtering.
    pub crop: String,

    /// Area in hectares.
    pub size: f64,

    pub owner_id: PrincipalId,

    /// Principals granted read/contribute access.
    #[serde(default)]
    pub access_control: Vec<PrincipalId>,
}

impl Field {
    /// Create a field owned by `owner` with an empty access-control list.
    pub fn new(name: impl Into<String>, crop: impl Into<String>, size: f64, owner: PrincipalId) -> Self {
        Self {
            name: name.into(),
            crop: crop.into(),
            size,
            owner_id: owner,
            access_control: Vec::new(),
        }
    }

    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        &self.owner_id == principal
    }

    pub fn is_shared_with(&self, principal: &PrincipalId) -> bool {
        self.access_control.contains(principal)
    }

    /// Whether `principal` may record or edit weighings on this field.
    pub fn can_contribute(&self, principal: &PrincipalId) -> bool {
        self.is_owned_by(principal) || self.is_shared_with(principal)
    }

    /// Add `principal` to the access-control list.
    ///
    /// Returns `true` when the list changed and `false` when the principal
    /// was already present (idempotent). The owner is never added to their
    /// own list.
    pub fn grant(&mut self, principal: PrincipalId) -> bool {
        if principal == self.owner_id || self.access_control.contains(&principal) {
            return false;
        }
        self.access_control.push(principal);
        true
    }

    /// Remove `principal` from the access-control list.
    ///
    /// Returns `true` when the list changed; revoking absent access is a
    /// silent no-op.
    pub fn revoke(&mut self, principal: &PrincipalId) -> bool {
        let before = self.access_control.len();
        self.access_control.retain(|entry| entry != principal);
        self.access_control.len() != before
    }
}
