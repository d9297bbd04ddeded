// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session controller: wires authentication events, the pending share token
//! and the destructive confirmations to the store workflows.

use std::future::Future;

use granary_core::{FieldId, PrincipalId, TokenId, now};
use granary_store::{FieldStore, TokenStore};
use tracing::{debug, warn};

use crate::SharingError;
use crate::redeem::redeem;
use crate::url::token_from_query;

/// The thin UI port the controller talks to.
///
/// Implementations render toasts and modal confirmations however they like;
/// the controller never formats anything else.
pub trait UserInterface {
    fn toast(&self, message: &str);

    fn confirm(&self, message: &str) -> impl Future<Output = bool> + Send;
}

/// Authentication state changes, as reported by the auth collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(PrincipalId),
    SignedOut,
}

/// Per-visit controller holding the signed-in principal and at most one
/// share token waiting for sign-in.
///
/// A token found in the arrival URL is parked until a [`AuthEvent::SignedIn`]
/// arrives, then redeemed exactly once. Signing out keeps the parked token so
/// switching accounts still redeems it.
#[derive(Debug)]
pub struct Session<S, U> {
    store: S,
    ui: U,
    current: Option<PrincipalId>,
    pending_token: Option<TokenId>,
}

impl<S, U> Session<S, U>
where
    S: TokenStore + FieldStore,
    U: UserInterface,
{
    pub fn new(store: S, ui: U) -> Self {
        Self {
            store,
            ui,
            current: None,
            pending_token: None,
        }
    }

    pub fn current(&self) -> Option<&PrincipalId> {
        self.current.as_ref()
    }

    pub fn has_pending_token(&self) -> bool {
        self.pending_token.is_some()
    }

    /// Record the arrival URL's query string, parking any share token in it.
    pub fn arrive(&mut self, query: &str) {
        if let Some(token) = token_from_query(query) {
            debug!(token = %token, "share token parked until sign-in");
            self.pending_token = Some(token);
        }
    }

    /// Apply an authentication event.
    ///
    /// Signing in redeems the parked token, if any, and toasts the outcome.
    /// A backend failure keeps the token parked so the next sign-in retries
    /// it.
    pub async fn on_auth(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(principal) => {
                self.current = Some(principal.clone());
                let Some(token) = self.pending_token.take() else {
                    return;
                };
                match redeem(&self.store, &token, &principal, now()).await {
                    Ok(outcome) => self.ui.toast(&outcome.user_message()),
                    Err(error) => {
                        warn!(token = %token, %error, "pending share token redemption failed");
                        self.pending_token = Some(token);
                        self.ui
                            .toast("Something went wrong while accepting the share.");
                    }
                }
            }
            AuthEvent::SignedOut => {
                self.current = None;
            }
        }
    }

    /// Delete one of the signed-in owner's fields, after confirmation.
    ///
    /// Returns whether the field was deleted.
    pub async fn delete_field(&self, id: &FieldId) -> Result<bool, SharingError> {
        let Some(owner) = &self.current else {
            return Ok(false);
        };
        let field = self
            .store
            .field(owner, id)
            .await
            .map_err(SharingError::backend)?
            .ok_or_else(|| SharingError::UnknownField(id.clone()))?;

        let prompt = format!(
            "Delete the field \"{}\"? All associated harvest data will be lost.",
            field.name
        );
        if !self.ui.confirm(&prompt).await {
            return Ok(false);
        }

        let deleted = crate::fields::delete_field(&self.store, owner, id).await?;
        if deleted {
            self.ui.toast("Field deleted.");
        }
        Ok(deleted)
    }

    /// Give up the signed-in principal's own access to a shared field, after
    /// confirmation.
    pub async fn leave_share(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
    ) -> Result<bool, SharingError> {
        let Some(principal) = &self.current else {
            return Ok(false);
        };
        if !self
            .ui
            .confirm("Leave this shared field? The owner can share it with you again later.")
            .await
        {
            return Ok(false);
        }

        crate::browser::leave_share(&self.store, principal, owner, field).await?;
        self.ui.toast("You no longer have access to this field.");
        Ok(true)
    }

    /// Revoke one grantee's access to all of the signed-in owner's fields,
    /// after confirmation.
    pub async fn revoke_all_for(
        &self,
        grantee: &PrincipalId,
        grantee_name: &str,
    ) -> Result<bool, SharingError> {
        let Some(owner) = &self.current else {
            return Ok(false);
        };
        let prompt = format!("Remove all of {grantee_name}'s access to your fields?");
        if !self.ui.confirm(&prompt).await {
            return Ok(false);
        }

        crate::registry::revoke_all(&self.store, owner, grantee).await?;
        self.ui.toast("Access removed.");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use granary_core::{Field, FieldId, PrincipalId, ShareTarget};
    use granary_store::{FieldStore, MemoryStore, TokenStore};

    use super::{AuthEvent, Session, UserInterface};
    use crate::issue::{Validity, issue};

    #[derive(Clone, Default)]
    struct RecordingUi {
        toasts: Arc<Mutex<Vec<String>>>,
        accept: Arc<AtomicBool>,
    }

    impl RecordingUi {
        fn accepting() -> Self {
            let ui = Self::default();
            ui.accept.store(true, Ordering::SeqCst);
            ui
        }

        fn toasts(&self) -> Vec<String> {
            self.toasts.lock().unwrap().clone()
        }
    }

    impl UserInterface for RecordingUi {
        fn toast(&self, message: &str) {
            self.toasts.lock().unwrap().push(message.to_string());
        }

        async fn confirm(&self, _message: &str) -> bool {
            self.accept.load(Ordering::SeqCst)
        }
    }

    fn olive() -> PrincipalId {
        PrincipalId::from("olive")
    }

    fn gilles() -> PrincipalId {
        PrincipalId::from("gilles")
    }

    async fn store_with_token() -> (MemoryStore, granary_core::TokenId) {
        let store = MemoryStore::new();
        let field = Field::new("North", "wheat", 10.0, olive());
        store
            .insert_field(&olive(), &FieldId::from("north"), &field)
            .await
            .unwrap();
        let target = ShareTarget::Single {
            field_id: FieldId::from("north"),
        };
        let token_id = issue(&store, &olive(), target, Validity::UntilUsed, 0)
            .await
            .unwrap();
        (store, token_id)
    }

    #[tokio::test]
    async fn arrival_token_is_redeemed_on_sign_in() {
        let (store, token_id) = store_with_token().await;
        let ui = RecordingUi::accepting();
        let mut session = Session::new(store.clone(), ui.clone());

        session.arrive(&format!("?token={token_id}"));
        assert!(session.has_pending_token());

        session.on_auth(AuthEvent::SignedIn(gilles())).await;
        assert!(!session.has_pending_token());
        assert_eq!(ui.toasts(), vec!["Access granted to the field."]);

        let field = store
            .field(&olive(), &FieldId::from("north"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(field.access_control, vec![gilles()]);
    }

    #[tokio::test]
    async fn sign_out_keeps_the_parked_token() {
        let (store, token_id) = store_with_token().await;
        let ui = RecordingUi::accepting();
        let mut session = Session::new(store, ui.clone());

        session.arrive(&format!("?token={token_id}"));
        session.on_auth(AuthEvent::SignedOut).await;
        assert!(session.has_pending_token());
        assert!(session.current().is_none());

        session.on_auth(AuthEvent::SignedIn(gilles())).await;
        assert!(!session.has_pending_token());
        assert_eq!(ui.toasts(), vec!["Access granted to the field."]);
    }

    #[tokio::test]
    async fn sign_in_without_a_token_toasts_nothing() {
        let (store, _) = store_with_token().await;
        let ui = RecordingUi::accepting();
        let mut session = Session::new(store, ui.clone());

        session.on_auth(AuthEvent::SignedIn(gilles())).await;
        assert_eq!(session.current(), Some(&gilles()));
        assert!(ui.toasts().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_keeps_the_token_for_a_retry() {
        use granary_store::test_utils::FlakyStore;

        let flaky = FlakyStore::new();
        let field = Field::new("North", "wheat", 10.0, olive());
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

        let ui = RecordingUi::accepting();
        let mut session = Session::new(flaky.clone(), ui.clone());
        session.arrive(&format!("?token={token_id}"));

        flaky.fail();
        session.on_auth(AuthEvent::SignedIn(gilles())).await;
        assert!(session.has_pending_token());
        assert_eq!(
            ui.toasts(),
            vec!["Something went wrong while accepting the share."]
        );

        flaky.recover();
        session.on_auth(AuthEvent::SignedIn(gilles())).await;
        assert!(!session.has_pending_token());
        assert_eq!(
            ui.toasts(),
            vec![
                "Something went wrong while accepting the share.",
                "Access granted to the field."
            ]
        );
    }

    #[tokio::test]
    async fn declined_confirmation_deletes_nothing() {
        let (store, _) = store_with_token().await;
        let ui = RecordingUi::default();
        let mut session = Session::new(store.clone(), ui.clone());
        session.on_auth(AuthEvent::SignedIn(olive())).await;

        let deleted = session.delete_field(&FieldId::from("north")).await.unwrap();
        assert!(!deleted);
        assert!(
            store
                .field(&olive(), &FieldId::from("north"))
                .await
                .unwrap()
                .is_some()
        );
        assert!(ui.toasts().is_empty());
    }

    #[tokio::test]
    async fn confirmed_deletion_removes_the_field() {
        let (store, _) = store_with_token().await;
        let ui = RecordingUi::accepting();
        let mut session = Session::new(store.clone(), ui.clone());
        session.on_auth(AuthEvent::SignedIn(olive())).await;

        let deleted = session.delete_field(&FieldId::from("north")).await.unwrap();
        assert!(deleted);
        assert!(
            store
                .field(&olive(), &FieldId::from("north"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(ui.toasts(), vec!["Field deleted."]);
    }
}
