//! Query engine for visiting entities by component set.
//!
//! A query names a tuple of component types, e.g. `(Transform, Sprite)`, and
//! visits every entity holding all of them in creation order.
//!
//! - [`World::query`] hands out shared references. The returned [`Query`] is
//!   restartable: each [`for_each`](Query::for_each) or [`iter`](Query::iter)
//!   re-scans the current entity set.
//! - [`World::modify`] hands out mutable references. Writes land directly in
//!   the columns, so a later pass observes them.
//!
//! ## Borrowing
//!
//! A modify pass lends each requested column out once per pass through a
//! [`ColumnCursor`]: every slot reference is handed to at most one visitor
//! call, which is sound because no two entities share a slot. A [`Modify`] holds the world exclusively,
//! so reading another component type while mutating has to happen in a
//! separate `query` pass beforehand.

use std::marker::PhantomData;

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::entity::{EntityId, EntityRecord};
use crate::storage::{out_of_range, AnyColumn, Column, SlotIndex};
use crate::world::{ensure_distinct, World};
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentSet trait -- a tuple of component types
// ---------------------------------------------------------------------------

/// A tuple of component types a query matches on: `(A,)`, `(A, B)`, ...
///
/// Implemented for `()` and tuples of one to six components.
pub trait ComponentSet: 'static {
    /// Per-entity output of a read-only pass: `(&A, &B, ...)`.
    type Refs<'w>;
    /// Per-entity output of a modify pass: `(&mut A, &mut B, ...)`.
    type Muts<'w>;
    /// Per-pass lending state for a modify pass.
    type Lender<'w>;

    /// Resolve every type, failing on undeclared ones.
    fn type_ids(registry: &ComponentRegistry) -> Result<Vec<ComponentTypeId>, EcsError>;

    /// Resolve every type, or `None` if any is undeclared.
    fn lookup_type_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>>;

    /// Fetch one entity's components. `columns` and `slots` are in tuple
    /// order.
    fn fetch<'w>(
        columns: &[&'w dyn AnyColumn],
        slots: &[SlotIndex],
    ) -> Result<Self::Refs<'w>, EcsError>;

    /// Split the requested columns into per-slot mutable references.
    fn lend<'w>(columns: &'w mut [&mut dyn AnyColumn]) -> Result<Self::Lender<'w>, EcsError>;

    /// Take one entity's components out of the lender.
    fn take<'w>(
        lender: &mut Self::Lender<'w>,
        slots: &[SlotIndex],
    ) -> Result<Self::Muts<'w>, EcsError>;
}

fn arity_mismatch<Q>(found: usize) -> EcsError {
    EcsError::ColumnTypeMismatch {
        requested: std::any::type_name::<Q>(),
        stored: if found == 0 { "<no columns>" } else { "<wrong column count>" },
    }
}

/// Forward cursor lending the slots of one column in increasing order.
///
/// A modify pass visits entities in creation order and columns are
/// append-only, so the slots requested from one column strictly increase.
/// The cursor walks the column once and hands out each reference at most
/// once without allocating.
pub struct ColumnCursor<'w, T> {
    values: std::slice::IterMut<'w, T>,
    /// Slot index of the next element `values` yields.
    next: usize,
    len: usize,
}

impl<'w, T: Component> ColumnCursor<'w, T> {
    pub fn new(column: &'w mut Column<T>) -> Self {
        let len = column.len();
        Self {
            values: column.iter_mut(),
            next: 0,
            len,
        }
    }

    /// Lend the value at `slot`, skipping every slot before it.
    ///
    /// Fails for slots past the end and for slots behind the cursor, which
    /// were already lent or skipped.
    pub fn take(&mut self, slot: SlotIndex) -> Result<&'w mut T, EcsError> {
        let index = slot.index();
        let Some(skip) = index.checked_sub(self.next) else {
            return Err(out_of_range::<T>(slot, self.len));
        };
        let value = self
            .values
            .nth(skip)
            .ok_or_else(|| out_of_range::<T>(slot, self.len))?;
        self.next = index + 1;
        Ok(value)
    }
}

impl ComponentSet for () {
    type Refs<'w> = ();
    type Muts<'w> = ();
    type Lender<'w> = ();

    fn type_ids(_registry: &ComponentRegistry) -> Result<Vec<ComponentTypeId>, EcsError> {
        Ok(Vec::new())
    }

    fn lookup_type_ids(_registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>> {
        Some(Vec::new())
    }

    fn fetch<'w>(
        _columns: &[&'w dyn AnyColumn],
        _slots: &[SlotIndex],
    ) -> Result<Self::Refs<'w>, EcsError> {
        Ok(())
    }

    fn lend<'w>(_columns: &'w mut [&mut dyn AnyColumn]) -> Result<Self::Lender<'w>, EcsError> {
        Ok(())
    }

    fn take<'w>(
        _lender: &mut Self::Lender<'w>,
        _slots: &[SlotIndex],
    ) -> Result<Self::Muts<'w>, EcsError> {
        Ok(())
    }
}

macro_rules! impl_component_set {
    ($(($ty:ident, $var:ident, $idx:tt)),+) => {
        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            type Refs<'w> = ($(&'w $ty,)+);
            type Muts<'w> = ($(&'w mut $ty,)+);
            type Lender<'w> = ($(ColumnCursor<'w, $ty>,)+);

            fn type_ids(registry: &ComponentRegistry) -> Result<Vec<ComponentTypeId>, EcsError> {
                Ok(vec![$(registry.resolve::<$ty>()?),+])
            }

            fn lookup_type_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>> {
                Some(vec![$(registry.lookup::<$ty>()?),+])
            }

            fn fetch<'w>(
                columns: &[&'w dyn AnyColumn],
                slots: &[SlotIndex],
            ) -> Result<Self::Refs<'w>, EcsError> {
                Ok(($({
                    let column: &'w dyn AnyColumn = columns[$idx];
                    column.typed::<$ty>()?.get(slots[$idx])?
                },)+))
            }

            fn lend<'w>(
                columns: &'w mut [&mut dyn AnyColumn],
            ) -> Result<Self::Lender<'w>, EcsError> {
                let found = columns.len();
                let [$($var),+] = columns else {
                    return Err(arity_mismatch::<Self>(found));
                };
                Ok(($(ColumnCursor::new($var.typed_mut::<$ty>()?),)+))
            }

            fn take<'w>(
                lender: &mut Self::Lender<'w>,
                slots: &[SlotIndex],
            ) -> Result<Self::Muts<'w>, EcsError> {
                Ok(($(lender.$idx.take(slots[$idx])?,)+))
            }
        }
    };
}

impl_component_set!((A, a, 0));
impl_component_set!((A, a, 0), (B, b, 1));
impl_component_set!((A, a, 0), (B, b, 1), (C, c, 2));
impl_component_set!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3));
impl_component_set!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4));
impl_component_set!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5));

/// Collect `record`'s slots for `ids` into `slots`.
///
/// Returns `false` when the record lacks any of the types, i.e. when
/// `record.has_components(ids)` does not hold.
fn fill_slots(record: &EntityRecord, ids: &[ComponentTypeId], slots: &mut Vec<SlotIndex>) -> bool {
    slots.clear();
    for ty in ids {
        match record.slot(*ty) {
            Some(slot) => slots.push(slot),
            None => return false,
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Query (read-only)
// ---------------------------------------------------------------------------

/// A read-only pass description returned by [`World::query`].
pub struct Query<'w, Q: ComponentSet> {
    entities: &'w [EntityRecord],
    type_ids: Vec<ComponentTypeId>,
    /// Requested columns in tuple order.
    columns: Vec<&'w dyn AnyColumn>,
    _marker: PhantomData<fn() -> Q>,
}

impl<'w, Q: ComponentSet> Query<'w, Q> {
    /// Visit every matching entity in creation order.
    ///
    /// Returns the number of visited entities.
    pub fn for_each<F>(&self, mut visitor: F) -> Result<usize, EcsError>
    where
        F: FnMut(EntityId, Q::Refs<'w>),
    {
        let mut visited = 0;
        for row in self.iter() {
            let (entity, refs) = row?;
            visitor(entity, refs);
            visited += 1;
        }
        Ok(visited)
    }

    /// A fresh iterator over the matching entities.
    pub fn iter(&self) -> QueryIter<'_, 'w, Q> {
        QueryIter {
            query: self,
            cursor: 0,
            slots: Vec::with_capacity(self.type_ids.len()),
        }
    }

    /// Ids of the matching entities, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|record| record.has_components(&self.type_ids))
            .map(EntityRecord::id)
    }

    /// Number of matching entities.
    pub fn count(&self) -> usize {
        self.entities().count()
    }

    /// The requested component types, in tuple order.
    pub fn type_ids(&self) -> &[ComponentTypeId] {
        &self.type_ids
    }
}

/// Iterator over a [`Query`], yielding `(EntityId, (&A, &B, ...))`.
///
/// A slot lookup failure is an invariant violation and is yielded as `Err`.
pub struct QueryIter<'q, 'w, Q: ComponentSet> {
    query: &'q Query<'w, Q>,
    cursor: usize,
    slots: Vec<SlotIndex>,
}

impl<'q, 'w, Q: ComponentSet> Iterator for QueryIter<'q, 'w, Q> {
    type Item = Result<(EntityId, Q::Refs<'w>), EcsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entities: &'w [EntityRecord] = self.query.entities;
        while let Some(record) = entities.get(self.cursor) {
            self.cursor += 1;
            if !fill_slots(record, &self.query.type_ids, &mut self.slots) {
                continue;
            }
            return Some(Q::fetch(&self.query.columns, &self.slots).map(|refs| (record.id(), refs)));
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Modify (mutable)
// ---------------------------------------------------------------------------

/// A mutable pass description returned by [`World::modify`].
pub struct Modify<'w, Q: ComponentSet> {
    entities: &'w [EntityRecord],
    type_ids: Vec<ComponentTypeId>,
    /// Requested columns in tuple order.
    columns: Vec<&'w mut dyn AnyColumn>,
    _marker: PhantomData<fn() -> Q>,
}

impl<'w, Q: ComponentSet> Modify<'w, Q> {
    /// Visit every matching entity in creation order with mutable access to
    /// its components.
    ///
    /// Can be called again to run another pass. Returns the number of
    /// visited entities.
    pub fn for_each<'s, F>(&'s mut self, mut visitor: F) -> Result<usize, EcsError>
    where
        F: FnMut(EntityId, Q::Muts<'s>),
    {
        let mut lender = Q::lend(&mut self.columns)?;
        let mut slots = Vec::with_capacity(self.type_ids.len());
        let mut visited = 0;
        for record in self.entities {
            if !fill_slots(record, &self.type_ids, &mut slots) {
                continue;
            }
            let items = Q::take(&mut lender, &slots)?;
            visitor(record.id(), items);
            visited += 1;
        }
        Ok(visited)
    }

    /// Ids of the matching entities, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|record| record.has_components(&self.type_ids))
            .map(EntityRecord::id)
    }
}

// ---------------------------------------------------------------------------
// World query methods
// ---------------------------------------------------------------------------

fn borrow_column(column: &Box<dyn AnyColumn>) -> &dyn AnyColumn {
    &**column
}

fn lend_column(column: &mut Box<dyn AnyColumn>) -> &mut dyn AnyColumn {
    &mut **column
}

fn no_column(registry: &ComponentRegistry, ty: ComponentTypeId) -> EcsError {
    EcsError::ColumnTypeMismatch {
        requested: registry.get_info(ty).map_or("<unknown>", |info| info.type_name),
        stored: "<no column>",
    }
}

impl World {
    /// Describe a read-only pass over every entity holding all of `Q`.
    ///
    /// ```
    /// use ecsps_ecs::prelude::*;
    ///
    /// struct Pos(i32);
    /// struct Tag;
    ///
    /// let mut world = World::builder()
    ///     .register::<Pos>("pos")
    ///     .register::<Tag>("tag")
    ///     .build()
    ///     .unwrap();
    /// world.create_entity((Pos(1), Tag)).unwrap();
    /// world.create_entity((Pos(2),)).unwrap();
    ///
    /// let mut sum = 0;
    /// world.query::<(Pos,)>().unwrap().for_each(|_, (pos,)| sum += pos.0).unwrap();
    /// assert_eq!(sum, 3);
    /// ```
    ///
    /// Fails if a type is undeclared or repeated.
    pub fn query<Q: ComponentSet>(&self) -> Result<Query<'_, Q>, EcsError> {
        let type_ids = Q::type_ids(&self.registry)?;
        ensure_distinct(&self.registry, &type_ids)?;
        let columns = type_ids
            .iter()
            .map(|ty| {
                self.columns
                    .get(ty.index())
                    .map(borrow_column)
                    .ok_or_else(|| no_column(&self.registry, *ty))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Query {
            entities: &self.entities,
            type_ids,
            columns,
            _marker: PhantomData,
        })
    }

    /// Describe a mutable pass over every entity holding all of `Q`.
    ///
    /// ```
    /// use ecsps_ecs::prelude::*;
    ///
    /// struct Pos(i32);
    ///
    /// let mut world = World::builder().register::<Pos>("pos").build().unwrap();
    /// let e = world.create_entity((Pos(21),)).unwrap();
    /// world.modify::<(Pos,)>().unwrap().for_each(|_, (pos,)| pos.0 *= 2).unwrap();
    /// assert_eq!(world.get::<Pos>(e).unwrap().0, 42);
    /// ```
    ///
    /// Fails if a type is undeclared or repeated.
    pub fn modify<Q: ComponentSet>(&mut self) -> Result<Modify<'_, Q>, EcsError> {
        let type_ids = Q::type_ids(&self.registry)?;
        ensure_distinct(&self.registry, &type_ids)?;

        let registry = &self.registry;
        let mut loans: Vec<Option<&mut Box<dyn AnyColumn>>> =
            self.columns.iter_mut().map(Some).collect();
        let columns = type_ids
            .iter()
            .map(|ty| {
                loans
                    .get_mut(ty.index())
                    .and_then(Option::take)
                    .map(lend_column)
                    .ok_or_else(|| no_column(registry, *ty))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Modify {
            entities: &self.entities,
            type_ids,
            columns,
            _marker: PhantomData,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
