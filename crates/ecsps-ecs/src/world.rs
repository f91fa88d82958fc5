//! The [`World`] is the top-level container of the store. It owns the
//! component registry, one column per declared component type, and the
//! append-only sequence of entity records.

use std::fmt;

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::entity::{EntityId, EntityRecord};
use crate::query::ComponentSet;
use crate::storage::{AnyColumn, Column, SlotIndex};
use crate::EcsError;

// ---------------------------------------------------------------------------
// Column helpers
// ---------------------------------------------------------------------------

fn column_ref<T: Component>(
    columns: &[Box<dyn AnyColumn>],
    id: ComponentTypeId,
) -> Result<&Column<T>, EcsError> {
    columns
        .get(id.index())
        .ok_or_else(|| missing_column::<T>())?
        .typed::<T>()
}

fn column_mut<T: Component>(
    columns: &mut [Box<dyn AnyColumn>],
    id: ComponentTypeId,
) -> Result<&mut Column<T>, EcsError> {
    columns
        .get_mut(id.index())
        .ok_or_else(|| missing_column::<T>())?
        .typed_mut::<T>()
}

fn missing_column<T>() -> EcsError {
    EcsError::ColumnTypeMismatch {
        requested: std::any::type_name::<T>(),
        stored: "<no column>",
    }
}

/// Reject a type list that names the same component type twice.
pub(crate) fn ensure_distinct(
    registry: &ComponentRegistry,
    ids: &[ComponentTypeId],
) -> Result<(), EcsError> {
    for (i, id) in ids.iter().enumerate() {
        if ids[..i].contains(id) {
            return Err(EcsError::DuplicateComponentType {
                component: registry.name_of(*id).to_owned(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// A tuple of component values handed to [`World::create_entity`].
///
/// Implemented for tuples of one to eight components.
pub trait Bundle: Sized {
    /// Resolve the component types of the tuple, in tuple order.
    fn type_ids(registry: &ComponentRegistry) -> Result<Vec<ComponentTypeId>, EcsError>;

    /// Append every value to its column and return the issued slots, in
    /// tuple order. `ids` is the output of [`type_ids`](Self::type_ids).
    fn append(
        self,
        columns: &mut [Box<dyn AnyColumn>],
        ids: &[ComponentTypeId],
    ) -> Result<Vec<(ComponentTypeId, SlotIndex)>, EcsError>;
}

macro_rules! impl_bundle {
    ($(($ty:ident, $idx:tt)),+) => {
        impl<$($ty: Component),+> Bundle for ($($ty,)+) {
            fn type_ids(registry: &ComponentRegistry) -> Result<Vec<ComponentTypeId>, EcsError> {
                Ok(vec![$(registry.resolve::<$ty>()?),+])
            }

            fn append(
                self,
                columns: &mut [Box<dyn AnyColumn>],
                ids: &[ComponentTypeId],
            ) -> Result<Vec<(ComponentTypeId, SlotIndex)>, EcsError> {
                Ok(vec![$({
                    let id = ids[$idx];
                    (id, column_mut::<$ty>(columns, id)?.push(self.$idx))
                }),+])
            }
        }
    };
}

impl_bundle!((A, 0));
impl_bundle!((A, 0), (B, 1));
impl_bundle!((A, 0), (B, 1), (C, 2));
impl_bundle!((A, 0), (B, 1), (C, 2), (D, 3));
impl_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6), (H, 7));

// ---------------------------------------------------------------------------
// WorldBuilder
// ---------------------------------------------------------------------------

/// Declares the closed set of component types before a [`World`] exists.
///
/// ```
/// use ecsps_ecs::prelude::*;
///
/// struct Position(f32, f32);
/// struct Velocity(f32, f32);
///
/// let world = World::builder()
///     .register::<Position>("position")
///     .register::<Velocity>("velocity")
///     .build()
///     .unwrap();
/// assert_eq!(world.registry().len(), 2);
/// ```
pub struct WorldBuilder {
    registry: ComponentRegistry,
    columns: Vec<Box<dyn AnyColumn>>,
    /// First declaration error; reported by `build`.
    error: Option<EcsError>,
}

impl WorldBuilder {
    fn new() -> Self {
        Self {
            registry: ComponentRegistry::new(),
            columns: Vec::new(),
            error: None,
        }
    }

    /// Declare component type `T` under `name`.
    ///
    /// Declaring the same type twice is a no-op. Reusing `name` for another
    /// type makes [`build`](Self::build) fail.
    pub fn register<T: Component>(mut self, name: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.registry.register::<T>(name) {
            Ok(id) if id.index() == self.columns.len() => {
                self.columns.push(Box::new(Column::<T>::new()));
            }
            Ok(_) => {}
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Freeze the declared set and create an empty world.
    pub fn build(self) -> Result<World, EcsError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        tracing::debug!(
            component_types = self.registry.len(),
            names = ?self.registry.registered_names(),
            "built world"
        );
        Ok(World {
            registry: self.registry,
            columns: self.columns,
            entities: Vec::new(),
        })
    }
}

impl fmt::Debug for WorldBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldBuilder")
            .field("registry", &self.registry)
            .field("error", &self.error)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The entity-component store.
///
/// Entities are only ever appended, each with a component set fixed at
/// creation. Component values are mutated in place through
/// [`get_mut`](Self::get_mut) or a [`modify`](Self::modify) pass.
pub struct World {
    /// Declared component types.
    pub(crate) registry: ComponentRegistry,
    /// One column per declared type, indexed by `ComponentTypeId.0`.
    pub(crate) columns: Vec<Box<dyn AnyColumn>>,
    /// Entity records in creation order, indexed by `EntityId.0`.
    pub(crate) entities: Vec<EntityRecord>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.entities.len())
            .field("component_types", &self.registry.registered_names())
            .finish()
    }
}

impl World {
    /// Start declaring the component types of a new world.
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    /// Read-only access to the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Number of entities created so far.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All entity records, in creation order.
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// The record of `entity`.
    pub fn entity(&self, entity: EntityId) -> Result<&EntityRecord, EcsError> {
        self.entities
            .get(entity.index() as usize)
            .ok_or(EcsError::UnknownEntity { entity })
    }

    // -- entity creation ----------------------------------------------------

    /// Create an entity holding every component in `bundle`.
    ///
    /// Fails without touching any column if a component type is undeclared
    /// or appears more than once in the bundle.
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> Result<EntityId, EcsError> {
        let ids = B::type_ids(&self.registry)?;
        ensure_distinct(&self.registry, &ids)?;

        let entity = EntityId::new(self.entities.len() as u32);
        let slots = bundle.append(&mut self.columns, &ids)?;
        self.entities.push(EntityRecord::new(entity, slots));
        tracing::trace!(%entity, components = ids.len(), "created entity");
        Ok(entity)
    }

    // -- component access ---------------------------------------------------

    /// Whether `entity` holds every type in `Q`.
    ///
    /// An undeclared type is never held, so it yields `false`. The empty set
    /// `()` is held by every entity.
    pub fn has_components<Q: ComponentSet>(&self, entity: EntityId) -> Result<bool, EcsError> {
        let record = self.entity(entity)?;
        Ok(Q::lookup_type_ids(&self.registry).is_some_and(|ids| record.has_components(&ids)))
    }

    /// Slot of `entity`'s `T` component.
    pub fn component_slot<T: Component>(&self, entity: EntityId) -> Result<SlotIndex, EcsError> {
        let record = self.entity(entity)?;
        let ty = self.registry.resolve::<T>()?;
        record.slot(ty).ok_or_else(|| EcsError::MissingComponent {
            entity,
            component: self.registry.name_of(ty).to_owned(),
        })
    }

    /// Shared access to `entity`'s `T` component.
    pub fn get<T: Component>(&self, entity: EntityId) -> Result<&T, EcsError> {
        let slot = self.component_slot::<T>(entity)?;
        self.column::<T>()?.get(slot)
    }

    /// Exclusive access to `entity`'s `T` component.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        let slot = self.component_slot::<T>(entity)?;
        let ty = self.registry.resolve::<T>()?;
        column_mut::<T>(&mut self.columns, ty)?.get_mut(slot)
    }

    /// The column holding every `T` value, in slot order.
    pub fn column<T: Component>(&self) -> Result<&Column<T>, EcsError> {
        let ty = self.registry.resolve::<T>()?;
        column_ref::<T>(&self.columns, ty)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
