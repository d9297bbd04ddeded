// SPDX-License-Identifier: MIT OR Apache-2.0

//! Share issuance: writing single-use token documents.

use std::time::Duration;

use granary_core::{PrincipalId, ShareTarget, ShareToken, Timestamp, TokenId};
use granary_store::{FieldStore, TokenStore};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::debug;

use crate::SharingError;

const TOKEN_ID_LENGTH: usize = 24;

/// How long an issued token stays redeemable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validity {
    /// Redeemable until `now + duration`.
    For(Duration),

    /// No expiry; the token lives until its first use.
    UntilUsed,
}

/// Generate a fresh random token id.
///
/// Uniqueness rests on the id's collision probability alone, which is
/// acceptable at this scale.
pub fn new_token_id() -> TokenId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_ID_LENGTH)
        .map(char::from)
        .collect();
    TokenId::from(id)
}

/// Issue a share token for one or several of the issuer's fields.
///
/// Writes exactly one token document and never touches the target fields.
/// The selection must be non-empty and every target must be owned by
/// `issuer`; both violations are caller errors, the regular UI only ever
/// offers the issuer's own fields.
pub async fn issue<S>(
    store: &S,
    issuer: &PrincipalId,
    target: ShareTarget,
    validity: Validity,
    now: Timestamp,
) -> Result<TokenId, SharingError>
where
    S: FieldStore + TokenStore,
{
    let token = ShareToken {
        owner_id: issuer.clone(),
        target,
        created_at: now,
        expires_at: match validity {
            Validity::For(duration) => Some(now + duration.as_secs()),
            Validity::UntilUsed => None,
        },
    };

    let field_ids = token.field_ids();
    if field_ids.is_empty() {
        return Err(SharingError::EmptySelection);
    }
    for field_id in field_ids {
        let Some(field) = store
            .field(issuer, field_id)
            .await
            .map_err(SharingError::backend)?
        else {
            return Err(SharingError::UnknownField(field_id.clone()));
        };
        if !field.is_owned_by(issuer) {
            return Err(SharingError::NotIssuerField(field_id.clone()));
        }
    }

    let token_id = new_token_id();
    store
        .insert_token(&token_id, &token)
        .await
        .map_err(SharingError::backend)?;
    debug!(issuer = %issuer, targets = field_ids.len(), "issued share token");

    Ok(token_id)
}
