//! Entity identifiers and slot mappings.
//!
//! Entities are append-only: an [`EntityId`] is the entity's position in the
//! world's creation sequence and never changes. Each entity owns an
//! [`EntityRecord`] mapping every component type it was created with to the
//! slot holding its value in that type's column.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;
use crate::storage::SlotIndex;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An entity identifier, equal to the entity's creation index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Construct an `EntityId` from a creation index.
    #[inline]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// The creation index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// The component-type -> slot mapping of one entity.
///
/// Entries are kept sorted by [`ComponentTypeId`]; the set is fixed at
/// creation and typically holds a handful of types.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    id: EntityId,
    slots: Vec<(ComponentTypeId, SlotIndex)>,
}

impl EntityRecord {
    /// Build a record. `slots` must not repeat a component type.
    pub(crate) fn new(id: EntityId, mut slots: Vec<(ComponentTypeId, SlotIndex)>) -> Self {
        slots.sort_unstable_by_key(|(ty, _)| *ty);
        debug_assert!(
            slots.windows(2).all(|w| w[0].0 != w[1].0),
            "entity record with repeated component type"
        );
        Self { id, slots }
    }

    /// The entity this record belongs to.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the entity holds a component of type `ty`.
    pub fn has_component(&self, ty: ComponentTypeId) -> bool {
        self.slot(ty).is_some()
    }

    /// True iff every type in `types` is present. The empty set is trivially
    /// held by every entity.
    pub fn has_components(&self, types: &[ComponentTypeId]) -> bool {
        types.iter().all(|ty| self.has_component(*ty))
    }

    /// Slot of the entity's `ty` component, if it has one.
    pub fn slot(&self, ty: ComponentTypeId) -> Option<SlotIndex> {
        self.slots
            .binary_search_by_key(&ty, |(t, _)| *t)
            .ok()
            .map(|i| self.slots[i].1)
    }

    /// Component types held by the entity, in type id order.
    pub fn component_types(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.slots.iter().map(|(ty, _)| *ty)
    }

    /// Number of components held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the entity was created without components.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
