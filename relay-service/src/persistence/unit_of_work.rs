//! Unit of work with the soft-delete rewrite pass
//!
//! Wraps a [`ChangeSession`] and intercepts its commit: deleted entries whose
//! type carries the soft-delete capability are stamped with the current UTC
//! time and flipped to `Modified` before any database round-trip, so the
//! downstream physical delete becomes an update. Everything else commits
//! untouched.

use std::sync::Arc;

use chrono::Utc;

use super::entity::{EntityMap, EntityState};
use super::error::PersistenceError;
use super::session::{ChangeSession, TrackedEntry};

/// One logical transaction over a change-tracking session.
///
/// Single-threaded by construction: a unit of work owns its session, and the
/// rewrite pass is a synchronous in-memory step scoped to one commit call.
pub struct UnitOfWork<S: ChangeSession> {
    session: S,
    map: Arc<EntityMap>,
}

impl<S: ChangeSession> UnitOfWork<S> {
    /// Wrap a session with the shared entity map.
    pub fn new(session: S, map: Arc<EntityMap>) -> Self {
        Self { session, map }
    }

    /// The wrapped session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Mutable access to the wrapped session, for tracking entries
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Recover the session, abandoning the unit of work.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Commit the unit of work.
    ///
    /// Runs the soft-delete rewrite exactly once, then delegates to the
    /// session's real commit. A failed commit propagates unchanged; the
    /// in-memory rewrite is discarded with the rest of the transaction by the
    /// engine's rollback.
    pub async fn commit(&mut self) -> Result<usize, PersistenceError> {
        self.divert_soft_deletes();
        self.session.commit().await
    }

    /// Rewrite eligible deletions as tombstones, in memory.
    ///
    /// All tombstones of one pass share a single timestamp. Entries already
    /// tombstoned in an earlier commit are no longer `Deleted` and are left
    /// alone.
    fn divert_soft_deletes(&mut self) {
        let now = Utc::now();
        let map = Arc::clone(&self.map);
        for entry in self.session.entries_mut() {
            if entry.state() != EntityState::Deleted {
                continue;
            }
            if !eligible(&map, entry) {
                continue;
            }
            match entry.entity_mut().as_soft_delete() {
                Some(soft) => {
                    soft.set_date_deleted(Some(now));
                    entry.set_state(EntityState::Modified);
                    tracing::debug!(
                        entity = entry.entity().type_name(),
                        "deletion diverted to tombstone update"
                    );
                }
                None => {
                    // The mapping claims the capability but the type does not
                    // expose it; leave the entry on the physical-delete path.
                    tracing::warn!(
                        entity = entry.entity().type_name(),
                        "mapped as soft-deletable but capability is not implemented"
                    );
                }
            }
        }
    }
}

/// Eligibility per the capability table, with the direct probe as the
/// fallback for unmapped types (the no-base path).
fn eligible(map: &EntityMap, entry: &mut TrackedEntry) -> bool {
    match map.soft_delete_eligible(entry.entity().type_name()) {
        Some(eligible) => eligible,
        None => entry.entity_mut().as_soft_delete().is_some(),
    }
}
