//! Canonical user directory.
//!
//! The reconciler and the local validator only see the [`UserStore`] trait,
//! so the in-memory map can be swapped for a real database without touching
//! either. Scans run in insertion order: when several records could satisfy
//! different match predicates, the earliest-created one wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::models::user::User;

/// Storage abstraction over the canonical user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First record satisfying the predicate, in insertion order.
    async fn find(&self, predicate: &(dyn for<'a> Fn(&'a User) -> bool + Sync)) -> Option<User>;

    /// Record with the given id.
    async fn get(&self, id: Uuid) -> Option<User>;

    /// Insert a new record. The id must not already be present.
    async fn insert(&self, user: User) -> User;

    /// Apply a mutation to the record with the given id and return the
    /// updated record, or `None` if no such record exists.
    async fn update(&self, id: Uuid, apply: &(dyn for<'a> Fn(&'a mut User) + Sync)) -> Option<User>;

    async fn count(&self) -> usize;
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// Insertion order of the ids in `users`.
    order: Vec<Uuid>,
}

/// Process-wide in-memory store. No persistence across restarts.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find(&self, predicate: &(dyn for<'a> Fn(&'a User) -> bool + Sync)) -> Option<User> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.users.get(id))
            .find(|u| predicate(u))
            .cloned()
    }

    async fn get(&self, id: Uuid) -> Option<User> {
        self.inner.read().await.users.get(&id).cloned()
    }

    async fn insert(&self, user: User) -> User {
        let mut inner = self.inner.write().await;
        inner.order.push(user.id);
        inner.users.insert(user.id, user.clone());
        user
    }

    async fn update(&self, id: Uuid, apply: &(dyn for<'a> Fn(&'a mut User) + Sync)) -> Option<User> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id)?;
        apply(user);
        Some(user.clone())
    }

    async fn count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

/// One async mutex per identity key.
///
/// Serializes the find-or-create window for a given key so that two
/// concurrent first-time logins for the same email cannot both miss the
/// lookup and insert duplicate records.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a key, creating it on first use.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
