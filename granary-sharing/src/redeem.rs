// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token redemption: the single-use grant state machine.

use granary_core::{PrincipalId, Timestamp, TokenId};
use granary_store::{FieldStore, TokenStore};
use tracing::{debug, warn};

use crate::SharingError;

/// Outcome of a redemption attempt.
///
/// Every variant except `Granted` is a terminal, non-retryable rejection.
/// Backend failures are *not* an outcome: they surface as
/// [`SharingError::Backend`] so callers can offer a retry instead of a
/// terminal message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redemption {
    /// Access was granted to this many fields and the token was consumed.
    Granted { fields: usize },

    /// No token with this id exists; it never did or was already used.
    InvalidOrUsed,

    /// The token's expiry lies in the past; the token was deleted.
    Expired,

    /// The issuer tried to redeem their own token; the token was deleted.
    SelfShare,

    /// The token body names no target; the token was deleted.
    Malformed,
}

impl Redemption {
    /// The toast text shown to the redeeming user.
    pub fn user_message(&self) -> String {
        match self {
            Redemption::Granted { fields: 1 } => "Access granted to the field.".to_string(),
            Redemption::Granted { fields } => format!("Access granted to {fields} fields."),
            Redemption::InvalidOrUsed => {
                "This share link is invalid or has already been used.".to_string()
            }
            Redemption::Expired => "This share link has expired.".to_string(),
            Redemption::SelfShare => "You cannot share a field with yourself.".to_string(),
            Redemption::Malformed => "This share link is not valid.".to_string(),
        }
    }
}

/// Redeem a token for `redeemer`.
///
/// Steps run strictly in order: lookup, expiry check, self-share check,
/// grant, consume. The token is deleted only after grants are confirmed so
/// a fault cannot leave access granted by a token that was never consumed;
/// the converse window (granted, then crash before deletion) is the
/// accepted risk of single-use semantics. Grants are set unions: redeeming
/// twice in a race cannot duplicate an access-list entry.
pub async fn redeem<S>(
    store: &S,
    token_id: &TokenId,
    redeemer: &PrincipalId,
    now: Timestamp,
) -> Result<Redemption, SharingError>
where
    S: TokenStore + FieldStore,
{
    let Some(token) = store.token(token_id).await.map_err(SharingError::backend)? else {
        debug!(token = %token_id, "redemption of unknown or used token");
        return Ok(Redemption::InvalidOrUsed);
    };

    if token.is_expired(now) {
        store
            .delete_token(token_id)
            .await
            .map_err(SharingError::backend)?;
        debug!(token = %token_id, "redemption of expired token");
        return Ok(Redemption::Expired);
    }

    if token.owner_id == *redeemer {
        store
            .delete_token(token_id)
            .await
            .map_err(SharingError::backend)?;
        debug!(token = %token_id, "self-share rejected");
        return Ok(Redemption::SelfShare);
    }

    let targets = token.field_ids();
    if targets.is_empty() {
        store
            .delete_token(token_id)
            .await
            .map_err(SharingError::backend)?;
        warn!(token = %token_id, "malformed token without targets");
        return Ok(Redemption::Malformed);
    }

    // One atomic batch for multi-target tokens; a plain per-document update
    // otherwise, exactly like the issuing side of the original flow.
    if let [target] = targets {
        store
            .grant_access(&token.owner_id, target, redeemer)
            .await
            .map_err(SharingError::backend)?;
    } else {
        store
            .grant_access_many(&token.owner_id, targets, redeemer)
            .await
            .map_err(SharingError::backend)?;
    }

    let fields = targets.len();
    store
        .delete_token(token_id)
        .await
        .map_err(SharingError::backend)?;
    debug!(token = %token_id, redeemer = %redeemer, fields, "share token redeemed");

    Ok(Redemption::Granted { fields })
}

#[cfg(test)]
mod tests {
    use granary_core::{Field, FieldId, PrincipalId, ShareTarget};
    use granary_store::{FieldStore, MemoryStore, TokenStore};

    use super::{Redemption, redeem};
    use crate::issue::{Validity, issue};

    fn olive() -> PrincipalId {
        PrincipalId::from("olive")
    }

    fn gilles() -> PrincipalId {
        PrincipalId::from("gilles")
    }

    async fn seed(store: &MemoryStore, ids: &[&str]) {
        for id in ids {
            let field = Field::new(*id, "wheat", 10.0, olive());
            store
                .insert_field(&olive(), &FieldId::from(*id), &field)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn first_use_grants_second_use_fails() {
        let store = MemoryStore::new();
        seed(&store, &["north"]).await;
        let target = ShareTarget::Single {
            field_id: FieldId::from("north"),
        };
        let token_id = issue(&store, &olive(), target, Validity::UntilUsed, 0)
            .await
            .unwrap();

        let outcome = redeem(&store, &token_id, &gilles(), 10).await.unwrap();
        assert_eq!(outcome, Redemption::Granted { fields: 1 });

        let field = store
            .field(&olive(), &FieldId::from("north"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(field.access_control, vec![gilles()]);
        assert!(store.token(&token_id).await.unwrap().is_none());

        let outcome = redeem(&store, &token_id, &gilles(), 11).await.unwrap();
        assert_eq!(outcome, Redemption::InvalidOrUsed);
    }

    #[tokio::test]
    async fn expired_token_is_deleted_without_granting() {
        let store = MemoryStore::new();
        seed(&store, &["north"]).await;
        let target = ShareTarget::Single {
            field_id: FieldId::from("north"),
        };
        let token_id = issue(
            &store,
            &olive(),
            target,
            Validity::For(std::time::Duration::from_secs(100)),
            1_000,
        )
        .await
        .unwrap();

        let outcome = redeem(&store, &token_id, &gilles(), 2_000).await.unwrap();
        assert_eq!(outcome, Redemption::Expired);
        assert!(store.token(&token_id).await.unwrap().is_none());

        let field = store
            .field(&olive(), &FieldId::from("north"))
            .await
            .unwrap()
            .unwrap();
        assert!(field.access_control.is_empty());
    }

    #[tokio::test]
    async fn self_share_is_rejected_and_consumes_the_token() {
        let store = MemoryStore::new();
        seed(&store, &["north"]).await;
        let target = ShareTarget::Single {
            field_id: FieldId::from("north"),
        };
        let token_id = issue(&store, &olive(), target, Validity::UntilUsed, 0)
            .await
            .unwrap();

        let outcome = redeem(&store, &token_id, &olive(), 10).await.unwrap();
        assert_eq!(outcome, Redemption::SelfShare);
        assert!(store.token(&token_id).await.unwrap().is_none());

        let field = store
            .field(&olive(), &FieldId::from("north"))
            .await
            .unwrap()
            .unwrap();
        assert!(field.access_control.is_empty());
    }

    #[tokio::test]
    async fn multi_token_grants_every_target() {
        let store = MemoryStore::new();
        seed(&store, &["north", "south", "east"]).await;
        let target = ShareTarget::Multi {
            field_ids: vec![
                FieldId::from("north"),
                FieldId::from("south"),
                FieldId::from("east"),
            ],
            crop_filter: Some("wheat".to_string()),
        };
        let token_id = issue(&store, &olive(), target, Validity::UntilUsed, 0)
            .await
            .unwrap();

        let outcome = redeem(&store, &token_id, &gilles(), 10).await.unwrap();
        assert_eq!(outcome, Redemption::Granted { fields: 3 });

        for id in ["north", "south", "east"] {
            let field = store
                .field(&olive(), &FieldId::from(id))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(field.access_control, vec![gilles()]);
        }
    }

    #[tokio::test]
    async fn regrant_does_not_duplicate_access() {
        let store = MemoryStore::new();
        seed(&store, &["north"]).await;
        let field_id = FieldId::from("north");

        // Two tokens for the same field, redeemed in immediate succession,
        // simulating a race between two grants.
        for _ in 0..2 {
            let target = ShareTarget::Single {
                field_id: field_id.clone(),
            };
            let token_id = issue(&store, &olive(), target, Validity::UntilUsed, 0)
                .await
                .unwrap();
            redeem(&store, &token_id, &gilles(), 10).await.unwrap();
        }

        let field = store.field(&olive(), &field_id).await.unwrap().unwrap();
        assert_eq!(field.access_control, vec![gilles()]);
    }

    #[tokio::test]
    async fn malformed_token_is_consumed() {
        use granary_core::ShareToken;
        use granary_core::TokenId;

        let store = MemoryStore::new();
        let token_id = TokenId::from("broken");
        let token = ShareToken {
            owner_id: olive(),
            target: ShareTarget::Multi {
                field_ids: vec![],
                crop_filter: None,
            },
            created_at: 0,
            expires_at: None,
        };
        store.insert_token(&token_id, &token).await.unwrap();

        let outcome = redeem(&store, &token_id, &gilles(), 10).await.unwrap();
        assert_eq!(outcome, Redemption::Malformed);
        assert!(store.token(&token_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn backend_failure_is_distinct_and_leaves_the_token() {
        use granary_store::test_utils::FlakyStore;

        use crate::SharingError;

        let flaky = FlakyStore::new();
        let field = Field::new("north", "wheat", 10.0, olive());
        flaky
            .insert_field(&olive(), &FieldId::from("north"), &field)
            .await
            .unwrap();
        let target = ShareTarget::Single {
            field_id: FieldId::from("north"),
        };
        let token_id = issue(&flaky, &olive(), target, Validity::UntilUsed, 0)
            .await
            .unwrap();

        flaky.fail();
        let result = redeem(&flaky, &token_id, &gilles(), 10).await;
        assert!(matches!(result, Err(SharingError::Backend(_))));

        // The token survived the failed attempt and is still redeemable.
        flaky.recover();
        let outcome = redeem(&flaky, &token_id, &gilles(), 10).await.unwrap();
        assert_eq!(outcome, Redemption::Granted { fields: 1 });
    }
}
