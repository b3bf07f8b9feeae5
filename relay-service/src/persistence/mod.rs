//! Soft-delete-aware persistence layer
//!
//! This module is the interception layer between application code and a
//! storage engine. It does not own an engine: the engine's change-tracking
//! session is an external collaborator behind [`ChangeSession`].
//!
//! [`UnitOfWork::commit`] runs a single in-memory rewrite pass before the
//! real write: tracked entries in the `Deleted` state whose type carries the
//! soft-delete capability are stamped with a UTC tombstone timestamp and
//! flipped to `Modified`, diverting the downstream physical delete into an
//! update. Owned (value-object) mappings and implicit many-to-many join
//! records are exempt and proceed to physical removal.
//!
//! Capability detection is a table lookup, not runtime type inspection:
//! [`EntityMap`] resolves each mapped type's tag once at registration and is
//! immutable afterwards.

pub mod entity;
pub mod error;
pub mod memory;
pub mod session;
pub mod unit_of_work;

pub use entity::{Entity, EntityDescriptor, EntityMap, EntityMapBuilder, EntityState, SoftDelete};
pub use error::PersistenceError;
pub use memory::{Keyed, MemorySession, MemoryStore};
pub use session::{ChangeSession, TrackedEntry};
pub use unit_of_work::UnitOfWork;
