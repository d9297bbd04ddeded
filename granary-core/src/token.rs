// SPDX-License-Identifier: MIT OR Apache-2.0

//! Share tokens: single-use, optionally time-bounded credentials.

use serde::{Deserialize, Serialize};

use crate::{FieldId, PrincipalId, Timestamp};

/// The field or fields a token grants access to.
///
/// Serialized untagged to match the storage boundary: single tokens carry a
/// `fieldId` attribute, multi tokens a `fieldIds` list plus an optional
/// crop-filter label used for display when the link was generated from a
/// filtered selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShareTarget {
    #[serde(rename_all = "camelCase")]
    Multi {
        field_ids: Vec<FieldId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crop_filter: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Single { field_id: FieldId },
}

/// A share token document, keyed in the store by its random [`TokenId`].
///
/// Tokens are never updated: they are written once by issuance and deleted
/// by redemption, whether that redemption grants access, detects expiry or
/// rejects a self-share. An absent expiry means "valid until first use".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareToken {
    pub owner_id: PrincipalId,

    #[serde(flatten)]
    pub target: ShareTarget,

    pub created_at: Timestamp,

    pub expires_at: Option<Timestamp>,
}

impl ShareToken {
    /// Whether the token carries an expiry that lies in the past.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }

    /// The target field ids, regardless of single or multi shape.
    pub fn field_ids(&self) -> &[FieldId] {
        match &self.target {
            ShareTarget::Single { field_id } => std::slice::from_ref(field_id),
            ShareTarget::Multi { field_ids, .. } => field_ids,
        }
    }
}
