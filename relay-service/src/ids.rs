//! Typed dispatch identifiers
//!
//! Each call to [`Mediator::send`](crate::mediator::Mediator::send) is tagged
//! with a [`DispatchId`] so log lines from every pipeline stage of one
//! dispatch can be correlated.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one dispatch through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchId(Uuid);

impl DispatchId {
    /// Mint a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DispatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_ids_are_unique() {
        assert_ne!(DispatchId::new(), DispatchId::new());
    }

    #[test]
    fn test_display_matches_uuid() {
        let id = DispatchId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
