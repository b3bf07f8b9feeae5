//! Entity traits, change states, and the soft-delete capability map
//!
//! An entity is soft-deletable when its own mapping, or its mapped base
//! type's mapping, declares the capability. Mappings marked owned
//! (value-object-like, no independent identity) or as implicit join records
//! of a many-to-many relation are exempt and always hard-deleted.
//!
//! The lookup is resolved once, when [`EntityMapBuilder::build`] runs, and
//! cached in an immutable table; commit-time eligibility is a plain map read.

use std::any::Any;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::error::PersistenceError;

/// State of one tracked entry during a single commit.
///
/// States are owned by the change-tracking session; the soft-delete rewrite
/// only ever moves an entry from `Deleted` to `Modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Loaded and untouched
    Unchanged,
    /// New row pending insert
    Added,
    /// Existing row pending update
    Modified,
    /// Existing row pending physical delete
    Deleted,
}

/// The soft-delete capability: a nullable tombstone timestamp.
///
/// An entity starts with no tombstone; the persistence layer sets it at
/// commit time and never erases the row itself.
pub trait SoftDelete {
    /// When the entity was logically deleted, if ever
    fn date_deleted(&self) -> Option<DateTime<Utc>>;

    /// Set or clear the tombstone timestamp
    fn set_date_deleted(&mut self, at: Option<DateTime<Utc>>);
}

/// A persisted entity as seen by the change tracker.
pub trait Entity: Send + 'static {
    /// Stable mapping name, matching this type's [`EntityDescriptor`]
    fn type_name(&self) -> &'static str;

    /// Capability probe, used for types with no registered mapping.
    ///
    /// Types implementing [`SoftDelete`] return `Some(self)`.
    fn as_soft_delete(&mut self) -> Option<&mut dyn SoftDelete> {
        None
    }

    /// Concrete-type access for store implementations
    fn as_any(&self) -> &dyn Any;
}

/// Mapping metadata for one entity type, registered at startup.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    type_name: &'static str,
    base_type: Option<&'static str>,
    soft_delete: bool,
    owned: bool,
    implicit_join: bool,
}

impl EntityDescriptor {
    /// Describe an entity type with no base, no capability, and no
    /// exemptions.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            base_type: None,
            soft_delete: false,
            owned: false,
            implicit_join: false,
        }
    }

    /// Declare the soft-delete capability on this type.
    pub fn soft_delete(mut self) -> Self {
        self.soft_delete = true;
        self
    }

    /// Name this type's mapped base type.
    ///
    /// When present, the base's declared capability decides soft-delete
    /// eligibility, not this type's own declaration.
    pub fn base_type(mut self, base: &'static str) -> Self {
        self.base_type = Some(base);
        self
    }

    /// Mark this mapping as owned (value-object-like); always hard-deleted.
    pub fn owned(mut self) -> Self {
        self.owned = true;
        self
    }

    /// Mark this mapping as an implicit many-to-many join record; always
    /// hard-deleted.
    pub fn implicit_join(mut self) -> Self {
        self.implicit_join = true;
        self
    }
}

/// Resolved capability tag for one mapped type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MappingTag {
    pub(crate) soft_delete: bool,
    pub(crate) owned: bool,
    pub(crate) implicit_join: bool,
}

/// Builder collecting descriptors before resolution.
#[derive(Debug, Default)]
pub struct EntityMapBuilder {
    descriptors: Vec<EntityDescriptor>,
}

impl EntityMapBuilder {
    /// Register one entity descriptor.
    pub fn entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Resolve every descriptor into an immutable capability table.
    ///
    /// Fails on a duplicate type name or a base type with no mapping of its
    /// own; both are startup wiring faults.
    pub fn build(self) -> Result<EntityMap, PersistenceError> {
        let mut by_name: HashMap<&'static str, &EntityDescriptor> = HashMap::new();
        for descriptor in &self.descriptors {
            if by_name.insert(descriptor.type_name, descriptor).is_some() {
                return Err(PersistenceError::DuplicateMapping(descriptor.type_name));
            }
        }

        let mut tags = HashMap::with_capacity(self.descriptors.len());
        for descriptor in &self.descriptors {
            // The mapped base type's declaration wins; a type with no base
            // is evaluated against its own declaration.
            let soft_delete = match descriptor.base_type {
                Some(base) => {
                    by_name
                        .get(base)
                        .ok_or(PersistenceError::UnknownBaseType {
                            entity: descriptor.type_name,
                            base,
                        })?
                        .soft_delete
                }
                None => descriptor.soft_delete,
            };
            tags.insert(
                descriptor.type_name,
                MappingTag {
                    soft_delete,
                    owned: descriptor.owned,
                    implicit_join: descriptor.implicit_join,
                },
            );
        }

        Ok(EntityMap { tags })
    }
}

/// Immutable capability-tag table keyed by entity type name.
///
/// Built once at mapping registration; read-only afterwards, so one map is
/// shared by every unit of work.
#[derive(Debug, Clone, Default)]
pub struct EntityMap {
    tags: HashMap<&'static str, MappingTag>,
}

impl EntityMap {
    /// Start building a map.
    pub fn builder() -> EntityMapBuilder {
        EntityMapBuilder::default()
    }

    pub(crate) fn tag(&self, type_name: &str) -> Option<MappingTag> {
        self.tags.get(type_name).copied()
    }

    /// Whether a mapped type's deletions are rewritten as tombstones.
    ///
    /// Returns `None` for unmapped types, which fall back to the direct
    /// capability probe at commit time.
    pub fn soft_delete_eligible(&self, type_name: &str) -> Option<bool> {
        self.tag(type_name)
            .map(|tag| tag.soft_delete && !tag.owned && !tag.implicit_join)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_declaration_decides_without_base() {
        let map = EntityMap::builder()
            .entity(EntityDescriptor::new("Widget").soft_delete())
            .entity(EntityDescriptor::new("AuditRow"))
            .build()
            .expect("map builds");

        assert_eq!(map.soft_delete_eligible("Widget"), Some(true));
        assert_eq!(map.soft_delete_eligible("AuditRow"), Some(false));
    }

    #[test]
    fn test_base_declaration_wins_over_own() {
        let map = EntityMap::builder()
            .entity(EntityDescriptor::new("TrackedEntity").soft_delete())
            .entity(EntityDescriptor::new("Widget").base_type("TrackedEntity"))
            .entity(EntityDescriptor::new("PlainEntity"))
            .entity(
                EntityDescriptor::new("Gadget")
                    .soft_delete()
                    .base_type("PlainEntity"),
            )
            .build()
            .expect("map builds");

        // Widget inherits the capability from its base despite not declaring it.
        assert_eq!(map.soft_delete_eligible("Widget"), Some(true));
        // Gadget's own declaration is ignored because its base declares nothing.
        assert_eq!(map.soft_delete_eligible("Gadget"), Some(false));
    }

    #[test]
    fn test_owned_and_join_mappings_are_exempt() {
        let map = EntityMap::builder()
            .entity(EntityDescriptor::new("Address").soft_delete().owned())
            .entity(EntityDescriptor::new("WidgetTag").soft_delete().implicit_join())
            .build()
            .expect("map builds");

        assert_eq!(map.soft_delete_eligible("Address"), Some(false));
        assert_eq!(map.soft_delete_eligible("WidgetTag"), Some(false));
    }

    #[test]
    fn test_unmapped_type_is_unknown() {
        let map = EntityMap::builder().build().expect("empty map builds");
        assert_eq!(map.soft_delete_eligible("Widget"), None);
    }

    #[test]
    fn test_unknown_base_is_a_wiring_fault() {
        let built = EntityMap::builder()
            .entity(EntityDescriptor::new("Widget").base_type("Missing"))
            .build();

        assert_eq!(
            built.err(),
            Some(PersistenceError::UnknownBaseType {
                entity: "Widget",
                base: "Missing",
            })
        );
    }

    #[test]
    fn test_duplicate_mapping_is_a_wiring_fault() {
        let built = EntityMap::builder()
            .entity(EntityDescriptor::new("Widget"))
            .entity(EntityDescriptor::new("Widget").soft_delete())
            .build();

        assert_eq!(built.err(), Some(PersistenceError::DuplicateMapping("Widget")));
    }
}
