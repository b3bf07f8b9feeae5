//! In-memory change-tracking session and row store
//!
//! A reference implementation of the [`ChangeSession`] collaborator, used by
//! this crate's tests and as a starting point for wiring a real engine. Rows
//! live in a shared map keyed by [`Keyed::key`]; a session tracks entries and
//! applies them on commit. Tombstoned rows stay in the map and are visible to
//! [`MemoryStore::fetch`] but excluded from [`MemoryStore::active`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::entity::{Entity, EntityState, SoftDelete};
use super::error::PersistenceError;
use super::session::{ChangeSession, TrackedEntry};

/// An entity with a primary key.
pub trait Keyed {
    /// Primary key type
    type Key: Eq + std::hash::Hash + Clone + Send;

    /// This entity's primary key
    fn key(&self) -> Self::Key;
}

/// Shared in-memory row store for one entity type.
pub struct MemoryStore<E: Keyed> {
    rows: Arc<Mutex<HashMap<E::Key, E>>>,
}

impl<E: Keyed> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<E: Keyed> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Keyed> MemoryStore<E> {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Open a session against this store.
    pub fn begin(&self) -> MemorySession<E> {
        MemorySession {
            rows: Arc::clone(&self.rows),
            entries: Vec::new(),
        }
    }

    /// Number of rows, tombstoned ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no rows
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<E::Key, E>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Keyed + Clone> MemoryStore<E> {
    /// Fetch a row by primary key, tombstoned or not.
    pub fn fetch(&self, key: &E::Key) -> Option<E> {
        self.lock().get(key).cloned()
    }

    /// Every row, tombstoned ones included
    pub fn all(&self) -> Vec<E> {
        self.lock().values().cloned().collect()
    }
}

impl<E: Keyed + SoftDelete + Clone> MemoryStore<E> {
    /// The default scan: rows without a tombstone.
    pub fn active(&self) -> Vec<E> {
        self.lock()
            .values()
            .filter(|row| row.date_deleted().is_none())
            .cloned()
            .collect()
    }
}

/// One unit of tracked changes against a [`MemoryStore`].
pub struct MemorySession<E: Keyed> {
    rows: Arc<Mutex<HashMap<E::Key, E>>>,
    entries: Vec<TrackedEntry>,
}

impl<E: Keyed + Entity> MemorySession<E> {
    /// Track an entity in the given state.
    pub fn track(&mut self, entity: E, state: EntityState) {
        self.entries.push(TrackedEntry::new(entity, state));
    }
}

#[async_trait]
impl<E> ChangeSession for MemorySession<E>
where
    E: Entity + Keyed + Clone,
{
    fn entries_mut(&mut self) -> &mut [TrackedEntry] {
        &mut self.entries
    }

    async fn commit(&mut self) -> Result<usize, PersistenceError> {
        let entries = std::mem::take(&mut self.entries);
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut applied = 0;
        for entry in entries {
            let (entity, state) = entry.into_parts();
            let type_name = entity.type_name();
            let Some(entity) = entity.as_any().downcast_ref::<E>().cloned() else {
                return Err(PersistenceError::CommitFailed(format!(
                    "entity `{type_name}` does not belong to this store"
                )));
            };
            match state {
                EntityState::Unchanged => {}
                EntityState::Added | EntityState::Modified => {
                    rows.insert(entity.key(), entity);
                    applied += 1;
                }
                EntityState::Deleted => {
                    rows.remove(&entity.key());
                    applied += 1;
                }
            }
        }
        Ok(applied)
    }
}
