// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-collaborator interfaces for granary.
//!
//! The hosted document database is an external collaborator: this crate
//! defines the trait surface the workflow layer consumes (document
//! get/set/update/delete, cross-owner membership queries, atomic batches
//! and push-based snapshot subscriptions) together with an in-memory
//! reference implementation used in tests and simulations.

mod error;
mod memory;
mod snapshots;
mod traits;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use snapshots::Snapshots;
pub use traits::{FieldStore, ProfileStore, TokenStore, TrailerDirectory, WeighingStore};
