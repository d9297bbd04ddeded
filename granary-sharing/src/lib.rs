// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field-sharing workflows: issuing single-use share tokens, redeeming them
//! against per-field access-control lists, listing and revoking grants, and
//! browsing fields shared by other owners.
//!
//! All operations are generic over the store traits from `granary-store`;
//! nothing here talks to a concrete backend or renders anything. The
//! [`Session`] controller ties the pieces to an authentication collaborator
//! and a thin UI port.

mod browser;
mod error;
mod fields;
mod issue;
mod redeem;
mod registry;
mod session;
mod url;

pub use browser::{SharedField, SharedFieldsView, UNKNOWN_OWNER, leave_share, list_shared_with_me};
pub use error::SharingError;
pub use fields::{
    create_field, delete_field, delete_weighing, edit_field, edit_weighing, finalize_weighing,
    record_full_weighing,
};
pub use issue::{Validity, issue, new_token_id};
pub use redeem::{Redemption, redeem};
pub use registry::{GranteeShares, UNKNOWN_USER, list_grantees, revoke_all, revoke_single};
pub use session::{AuthEvent, Session, UserInterface};
pub use url::{share_url, token_from_query};
