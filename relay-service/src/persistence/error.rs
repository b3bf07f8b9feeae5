//! Persistence error types

use thiserror::Error;

/// Errors raised by entity-map wiring or a failed commit.
///
/// Mapping errors (`DuplicateMapping`, `UnknownBaseType`) are wiring faults
/// surfaced when the map is built at startup. Commit errors come from the
/// underlying session and propagate unchanged; this layer adds no retry or
/// rollback logic of its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// Two descriptors were registered for one entity type name
    #[error("duplicate entity mapping for `{0}`")]
    DuplicateMapping(&'static str),

    /// A descriptor names a base type with no mapping of its own
    #[error("entity `{entity}` maps to unknown base type `{base}`")]
    UnknownBaseType {
        /// Entity whose descriptor is at fault
        entity: &'static str,
        /// The unmapped base type name
        base: &'static str,
    },

    /// The backing store rejected a write (unique key, foreign key, check)
    #[error("constraint violation during commit: {0}")]
    ConstraintViolation(String),

    /// The commit failed for any other engine-side reason
    #[error("commit failed: {0}")]
    CommitFailed(String),
}
