// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Failures reported by the reference store implementations.
///
/// `NotFound` mirrors the document database rejecting an update on a missing
/// document; `Backend` stands in for connectivity, permission or index
/// failures of a hosted backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("backend failure: {0}")]
    Backend(String),
}
