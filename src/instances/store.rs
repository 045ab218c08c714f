//! Instance storage.
//!
//! # Design Decisions
//! - The store is a trait; `MemoryStore` serves tests and throwaway runs,
//!   `SqliteStore` keeps credentials across restarts
//! - Ids are assigned by the store and never reused

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use futures_util::future::{self, BoxFuture};
use thiserror::Error;

use crate::instances::model::{Instance, NewInstance};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Future returned by store calls.
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, StoreError>>;

/// Row-level access to stored instances.
pub trait InstanceStore: Send + Sync {
    fn insert(&self, new: NewInstance) -> StoreFuture<'_, Instance>;

    fn get(&self, id: i64) -> StoreFuture<'_, Option<Instance>>;

    /// All instances ordered by id.
    fn list(&self) -> StoreFuture<'_, Vec<Instance>>;

    /// Returns false when no such instance exists.
    fn update_name<'a>(&'a self, id: i64, name: &'a str) -> StoreFuture<'a, bool>;

    /// Returns false when no such instance exists.
    fn delete(&self, id: i64) -> StoreFuture<'_, bool>;
}

/// Process-local store backed by a concurrent map.
#[derive(Debug)]
pub struct MemoryStore {
    rows: DashMap<i64, Instance>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceStore for MemoryStore {
    fn insert(&self, new: NewInstance) -> StoreFuture<'_, Instance> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let instance = new.into_instance(id);
        self.rows.insert(id, instance.clone());
        Box::pin(future::ready(Ok(instance)))
    }

    fn get(&self, id: i64) -> StoreFuture<'_, Option<Instance>> {
        let row = self.rows.get(&id).map(|row| row.value().clone());
        Box::pin(future::ready(Ok(row)))
    }

    fn list(&self) -> StoreFuture<'_, Vec<Instance>> {
        let mut rows: Vec<Instance> = self.rows.iter().map(|row| row.value().clone()).collect();
        rows.sort_by_key(|row| row.id);
        Box::pin(future::ready(Ok(rows)))
    }

    fn update_name<'a>(&'a self, id: i64, name: &'a str) -> StoreFuture<'a, bool> {
        let updated = match self.rows.get_mut(&id) {
            Some(mut row) => {
                row.name = Some(name.to_string());
                true
            }
            None => false,
        };
        Box::pin(future::ready(Ok(updated)))
    }

    fn delete(&self, id: i64) -> StoreFuture<'_, bool> {
        let removed = self.rows.remove(&id).is_some();
        Box::pin(future::ready(Ok(removed)))
    }
}
