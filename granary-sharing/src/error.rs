// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use granary_core::{FieldId, PrincipalId};
use thiserror::Error;

/// Failures of the sharing workflows.
///
/// The first variants are caller errors caught before any store write; they
/// never occur through the regular UI, which only offers valid selections.
/// `Backend` wraps any error reported by the storage collaborator and is the
/// retryable counterpart to the terminal token outcomes in
/// [`Redemption`](crate::Redemption).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SharingError {
    #[error("share selection is empty")]
    EmptySelection,

    #[error("field does not belong to the issuer: {0}")]
    NotIssuerField(FieldId),

    #[error("unknown field: {0}")]
    UnknownField(FieldId),

    #[error("{0}")]
    InvalidInput(String),

    #[error("principal is not allowed to modify this field: {0}")]
    PermissionDenied(PrincipalId),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl SharingError {
    /// Wrap a store error, keeping its message for the user-facing hint.
    pub(crate) fn backend(error: impl Display) -> Self {
        Self::Backend(error.to_string())
    }
}
