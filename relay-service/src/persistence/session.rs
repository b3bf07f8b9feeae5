//! Change-tracking session contract
//!
//! The storage engine's session is an external collaborator: it tracks
//! entries, exposes them for the pre-commit rewrite pass, and performs the
//! real write. One session instance is one logical transaction and is used
//! single-threaded.

use async_trait::async_trait;

use super::entity::{Entity, EntityState};
use super::error::PersistenceError;

/// One tracked entity plus its pending change state.
pub struct TrackedEntry {
    entity: Box<dyn Entity>,
    state: EntityState,
}

impl TrackedEntry {
    /// Track an entity in the given state.
    pub fn new(entity: impl Entity, state: EntityState) -> Self {
        Self {
            entity: Box::new(entity),
            state,
        }
    }

    /// Pending change state
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Reassign the pending change state.
    pub fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }

    /// The tracked entity
    pub fn entity(&self) -> &dyn Entity {
        self.entity.as_ref()
    }

    /// Mutable access to the tracked entity
    pub fn entity_mut(&mut self) -> &mut dyn Entity {
        self.entity.as_mut()
    }

    /// Split into entity and state, for store implementations applying the
    /// commit.
    pub fn into_parts(self) -> (Box<dyn Entity>, EntityState) {
        (self.entity, self.state)
    }
}

/// The storage engine's change-tracking session.
///
/// [`UnitOfWork`](super::unit_of_work::UnitOfWork) reads and rewrites
/// [`TrackedEntry`] values through `entries_mut` before delegating the real
/// write to `commit`. Commit failures propagate unchanged; transactional
/// rollback is the engine's guarantee, not this layer's.
#[async_trait]
pub trait ChangeSession: Send {
    /// Entries tracked for the pending commit
    fn entries_mut(&mut self) -> &mut [TrackedEntry];

    /// Flush the tracked changes to the backing store, returning the number
    /// of rows written.
    async fn commit(&mut self) -> Result<usize, PersistenceError>;
}
