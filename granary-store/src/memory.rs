// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory reference implementation of the store traits.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use granary_core::{Field, FieldId, PrincipalId, Profile, ShareToken, TokenId, Weighing, WeighingId};
use tokio::sync::watch;

use crate::traits::{FieldStore, ProfileStore, TokenStore, TrailerDirectory, WeighingStore};
use crate::{Snapshots, StoreError};

type FieldKey = (PrincipalId, FieldId);

#[derive(Debug)]
enum FieldQuery {
    Owner(PrincipalId),
    SharedWith(PrincipalId),
}

#[derive(Debug)]
struct FieldWatcher {
    query: FieldQuery,
    tx: watch::Sender<Vec<(FieldId, Field)>>,
}

#[derive(Debug)]
struct WeighingWatcher {
    key: FieldKey,
    tx: watch::Sender<Vec<(WeighingId, Weighing)>>,
}

#[derive(Debug, Default)]
pub struct InnerMemoryStore {
    fields: HashMap<FieldKey, Field>,
    weighings: HashMap<FieldKey, BTreeMap<WeighingId, Weighing>>,
    tokens: HashMap<TokenId, ShareToken>,
    profiles: HashMap<PrincipalId, Profile>,
    trailer_names: HashMap<PrincipalId, BTreeSet<String>>,
    next_weighing: u64,
    field_watchers: Vec<FieldWatcher>,
    weighing_watchers: Vec<WeighingWatcher>,
}

impl InnerMemoryStore {
    /// Re-evaluate every live field query and push changed results.
    ///
    /// Watchers whose receiving side was dropped are pruned here, which
    /// keeps subscription teardown implicit in handle ownership.
    fn notify_fields(&mut self) {
        self.field_watchers.retain(|watcher| !watcher.tx.is_closed());
        for watcher in &self.field_watchers {
            let next = eval_fields(&self.fields, &watcher.query);
            watcher.tx.send_if_modified(|current| {
                if *current != next {
                    *current = next;
                    true
                } else {
                    false
                }
            });
        }
    }

    fn notify_weighings(&mut self, key: &FieldKey) {
        self.weighing_watchers
            .retain(|watcher| !watcher.tx.is_closed());
        for watcher in &self.weighing_watchers {
            if &watcher.key != key {
                continue;
            }
            let next = eval_weighings(&self.weighings, key);
            watcher.tx.send_if_modified(|current| {
                if *current != next {
                    *current = next;
                    true
                } else {
                    false
                }
            });
        }
    }
}

fn eval_fields(fields: &HashMap<FieldKey, Field>, query: &FieldQuery) -> Vec<(FieldId, Field)> {
    let mut results: Vec<(FieldId, Field)> = fields
        .iter()
        .filter(|((owner, _), field)| match query {
            FieldQuery::Owner(principal) => owner == principal,
            FieldQuery::SharedWith(principal) => field.access_control.contains(principal),
        })
        .map(|((_, id), field)| (id.clone(), field.clone()))
        .collect();
    results.sort_by(|(a, _), (b, _)| a.cmp(b));
    results
}

fn eval_weighings(
    weighings: &HashMap<FieldKey, BTreeMap<WeighingId, Weighing>>,
    key: &FieldKey,
) -> Vec<(WeighingId, Weighing)> {
    weighings
        .get(key)
        .map(|entries| {
            entries
                .iter()
                .map(|(id, weighing)| (id.clone(), weighing.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn field_path(owner: &PrincipalId, id: &FieldId) -> String {
    format!("users/{owner}/fields/{id}")
}

/// An in-memory store implementing the full collaborator surface.
///
/// `MemoryStore` supports usage in asynchronous and multi-threaded contexts
/// by wrapping an [`InnerMemoryStore`] with an `RwLock` and `Arc`; cloned
/// handles share state. Batch operations validate every target under a
/// single write lock before applying anything, so a failed batch leaves the
/// store untouched.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<InnerMemoryStore>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a read-lock on the store.
    fn read_store(&self) -> RwLockReadGuard<'_, InnerMemoryStore> {
        self.inner
            .read()
            .expect("acquire shared read access on store")
    }

    /// Obtain a write-lock on the store.
    fn write_store(&self) -> RwLockWriteGuard<'_, InnerMemoryStore> {
        self.inner
            .write()
            .expect("acquire exclusive write access on store")
    }
}

impl TokenStore for MemoryStore {
    type Error = StoreError;

    async fn insert_token(&self, id: &TokenId, token: &ShareToken) -> Result<(), Self::Error> {
        self.write_store()
            .tokens
            .insert(id.clone(), token.clone());
        Ok(())
    }

    async fn token(&self, id: &TokenId) -> Result<Option<ShareToken>, Self::Error> {
        Ok(self.read_store().tokens.get(id).cloned())
    }

    async fn delete_token(&self, id: &TokenId) -> Result<bool, Self::Error> {
        Ok(self.write_store().tokens.remove(id).is_some())
    }
}

impl FieldStore for MemoryStore {
    type Error = StoreError;

    async fn field(&self, owner: &PrincipalId, id: &FieldId) -> Result<Option<Field>, Self::Error> {
        Ok(self
            .read_store()
            .fields
            .get(&(owner.clone(), id.clone()))
            .cloned())
    }

    async fn insert_field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        field: &Field,
    ) -> Result<(), Self::Error> {
        let mut store = self.write_store();
        store
            .fields
            .insert((owner.clone(), id.clone()), field.clone());
        store.notify_fields();
        Ok(())
    }

    async fn update_field(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        name: &str,
        crop: &str,
        size: f64,
    ) -> Result<(), Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), id.clone());
        let Some(field) = store.fields.get_mut(&key) else {
            return Err(StoreError::NotFound(field_path(owner, id)));
        };
        field.name = name.to_string();
        field.crop = crop.to_string();
        field.size = size;
        store.notify_fields();
        Ok(())
    }

    async fn delete_field(&self, owner: &PrincipalId, id: &FieldId) -> Result<bool, Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), id.clone());
        let removed = store.fields.remove(&key).is_some();
        if removed {
            // Cascade: a deleted field takes its weighing sub-collection
            // with it.
            store.weighings.remove(&key);
            store.notify_fields();
            store.notify_weighings(&key);
        }
        Ok(removed)
    }

    async fn owner_fields(&self, owner: &PrincipalId) -> Result<Vec<(FieldId, Field)>, Self::Error> {
        let store = self.read_store();
        Ok(eval_fields(
            &store.fields,
            &FieldQuery::Owner(owner.clone()),
        ))
    }

    async fn fields_shared_with(
        &self,
        principal: &PrincipalId,
    ) -> Result<Vec<(FieldId, Field)>, Self::Error> {
        let store = self.read_store();
        Ok(eval_fields(
            &store.fields,
            &FieldQuery::SharedWith(principal.clone()),
        ))
    }

    async fn grant_access(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        principal: &PrincipalId,
    ) -> Result<bool, Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), id.clone());
        let Some(field) = store.fields.get_mut(&key) else {
            return Err(StoreError::NotFound(field_path(owner, id)));
        };
        let changed = field.grant(principal.clone());
        if changed {
            store.notify_fields();
        }
        Ok(changed)
    }

    async fn revoke_access(
        &self,
        owner: &PrincipalId,
        id: &FieldId,
        principal: &PrincipalId,
    ) -> Result<bool, Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), id.clone());
        let Some(field) = store.fields.get_mut(&key) else {
            return Err(StoreError::NotFound(field_path(owner, id)));
        };
        let changed = field.revoke(principal);
        if changed {
            store.notify_fields();
        }
        Ok(changed)
    }

    async fn grant_access_many(
        &self,
        owner: &PrincipalId,
        ids: &[FieldId],
        principal: &PrincipalId,
    ) -> Result<usize, Self::Error> {
        let mut store = self.write_store();
        for id in ids {
            if !store.fields.contains_key(&(owner.clone(), id.clone())) {
                return Err(StoreError::NotFound(field_path(owner, id)));
            }
        }
        let mut changed = 0;
        for id in ids {
            if let Some(field) = store.fields.get_mut(&(owner.clone(), id.clone()))
                && field.grant(principal.clone())
            {
                changed += 1;
            }
        }
        if changed > 0 {
            store.notify_fields();
        }
        Ok(changed)
    }

    async fn revoke_access_many(
        &self,
        owner: &PrincipalId,
        ids: &[FieldId],
        principal: &PrincipalId,
    ) -> Result<usize, Self::Error> {
        let mut store = self.write_store();
        for id in ids {
            if !store.fields.contains_key(&(owner.clone(), id.clone())) {
                return Err(StoreError::NotFound(field_path(owner, id)));
            }
        }
        let mut changed = 0;
        for id in ids {
            if let Some(field) = store.fields.get_mut(&(owner.clone(), id.clone()))
                && field.revoke(principal)
            {
                changed += 1;
            }
        }
        if changed > 0 {
            store.notify_fields();
        }
        Ok(changed)
    }

    async fn watch_owner_fields(
        &self,
        owner: &PrincipalId,
    ) -> Result<Snapshots<Vec<(FieldId, Field)>>, Self::Error> {
        let mut store = self.write_store();
        let query = FieldQuery::Owner(owner.clone());
        let (tx, rx) = watch::channel(eval_fields(&store.fields, &query));
        store.field_watchers.push(FieldWatcher { query, tx });
        Ok(Snapshots::new(rx))
    }

    async fn watch_shared_with(
        &self,
        principal: &PrincipalId,
    ) -> Result<Snapshots<Vec<(FieldId, Field)>>, Self::Error> {
        let mut store = self.write_store();
        let query = FieldQuery::SharedWith(principal.clone());
        let (tx, rx) = watch::channel(eval_fields(&store.fields, &query));
        store.field_watchers.push(FieldWatcher { query, tx });
        Ok(Snapshots::new(rx))
    }
}

impl WeighingStore for MemoryStore {
    type Error = StoreError;

    async fn weighings(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
    ) -> Result<Vec<(WeighingId, Weighing)>, Self::Error> {
        let store = self.read_store();
        Ok(eval_weighings(
            &store.weighings,
            &(owner.clone(), field.clone()),
        ))
    }

    async fn weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
    ) -> Result<Option<Weighing>, Self::Error> {
        Ok(self
            .read_store()
            .weighings
            .get(&(owner.clone(), field.clone()))
            .and_then(|entries| entries.get(id))
            .cloned())
    }

    async fn add_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        weighing: &Weighing,
    ) -> Result<WeighingId, Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), field.clone());
        if !store.fields.contains_key(&key) {
            return Err(StoreError::NotFound(field_path(owner, field)));
        }
        store.next_weighing += 1;
        // Zero-padded so that id order is creation order.
        let id = WeighingId::from(format!("w{:08}", store.next_weighing));
        store
            .weighings
            .entry(key.clone())
            .or_default()
            .insert(id.clone(), weighing.clone());
        store.notify_weighings(&key);
        Ok(id)
    }

    async fn update_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
        weighing: &Weighing,
    ) -> Result<(), Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), field.clone());
        let Some(entry) = store
            .weighings
            .get_mut(&key)
            .and_then(|entries| entries.get_mut(id))
        else {
            return Err(StoreError::NotFound(format!(
                "{}/weighings/{id}",
                field_path(owner, field)
            )));
        };
        *entry = weighing.clone();
        store.notify_weighings(&key);
        Ok(())
    }

    async fn finalize_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
        empty: f64,
    ) -> Result<(), Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), field.clone());
        let Some(entry) = store
            .weighings
            .get_mut(&key)
            .and_then(|entries| entries.get_mut(id))
        else {
            return Err(StoreError::NotFound(format!(
                "{}/weighings/{id}",
                field_path(owner, field)
            )));
        };
        entry.empty = Some(empty);
        store.notify_weighings(&key);
        Ok(())
    }

    async fn delete_weighing(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
        id: &WeighingId,
    ) -> Result<bool, Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), field.clone());
        let removed = store
            .weighings
            .get_mut(&key)
            .is_some_and(|entries| entries.remove(id).is_some());
        if removed {
            store.notify_weighings(&key);
        }
        Ok(removed)
    }

    async fn watch_weighings(
        &self,
        owner: &PrincipalId,
        field: &FieldId,
    ) -> Result<Snapshots<Vec<(WeighingId, Weighing)>>, Self::Error> {
        let mut store = self.write_store();
        let key = (owner.clone(), field.clone());
        let (tx, rx) = watch::channel(eval_weighings(&store.weighings, &key));
        store.weighing_watchers.push(WeighingWatcher { key, tx });
        Ok(Snapshots::new(rx))
    }
}

impl ProfileStore for MemoryStore {
    type Error = StoreError;

    async fn profile(&self, principal: &PrincipalId) -> Result<Option<Profile>, Self::Error> {
        Ok(self.read_store().profiles.get(principal).cloned())
    }

    async fn insert_profile(
        &self,
        principal: &PrincipalId,
        profile: &Profile,
    ) -> Result<(), Self::Error> {
        self.write_store()
            .profiles
            .insert(principal.clone(), profile.clone());
        Ok(())
    }
}

impl TrailerDirectory for MemoryStore {
    type Error = StoreError;

    async fn trailer_names(&self, owner: &PrincipalId) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .read_store()
            .trailer_names
            .get(owner)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_trailer_name(&self, owner: &PrincipalId, name: &str) -> Result<(), Self::Error> {
        self.write_store()
            .trailer_names
            .entry(owner.clone())
            .or_default()
            .insert(name.to_string());
        Ok(())
    }
}
