// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core data types for field sharing and harvest tracking.
//!
//! This crate holds the records exchanged with the document store (fields,
//! weighings, share tokens, principal profiles) and the pure aggregation
//! functions over them. It performs no I/O.

mod field;
mod harvest;
mod identity;
mod profile;
mod time;
mod token;
mod weighing;

pub use field::Field;
pub use harvest::{HarvestTotals, QualityAverages, net_weight, quality_averages, totals};
pub use identity::{FieldId, PrincipalId, TokenId, WeighingId};
pub use profile::Profile;
pub use time::{Timestamp, now};
pub use token::{ShareTarget, ShareToken};
pub use weighing::Weighing;
