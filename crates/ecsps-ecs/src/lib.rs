//! ecsps ECS -- a small entity-component store with typed queries.
//!
//! Every component type is declared up front; each owns one append-only
//! column. Entities are created once with a fixed component set and are
//! never removed, so every slot index handed out stays valid for the life
//! of the [`World`](world::World). Systems visit entities through
//! [`query`](world::World::query) (shared access) and
//! [`modify`](world::World::modify) (mutable access) passes.
//!
//! The crate also hosts the shared-resource cache used by rendering
//! ([`ResourcePool`](pool::ResourcePool)) and interned [`Keyword`]s.
//!
//! # Quick Start
//!
//! ```
//! use ecsps_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut world = World::builder()
//!     .register::<Position>("position")
//!     .register::<Velocity>("velocity")
//!     .build()
//!     .unwrap();
//!
//! let moving = world
//!     .create_entity((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 2.0 }))
//!     .unwrap();
//! world.create_entity((Position { x: 5.0, y: 5.0 },)).unwrap();
//!
//! world
//!     .modify::<(Position, Velocity)>()
//!     .unwrap()
//!     .for_each(|_, (pos, vel)| {
//!         pos.x += vel.dx;
//!         pos.y += vel.dy;
//!     })
//!     .unwrap();
//!
//! assert_eq!(world.get::<Position>(moving).unwrap(), &Position { x: 1.0, y: 2.0 });
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod keyword;
pub mod pool;
pub mod query;
pub mod storage;
pub mod world;

pub use keyword::Keyword;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A slot index was never issued by the column it was looked up in.
    #[error("slot {slot} out of range for component '{component}' (column length {len})")]
    OutOfRange {
        component: &'static str,
        slot: storage::SlotIndex,
        len: usize,
    },

    /// The entity was created without the requested component.
    #[error("entity {entity} has no component '{component}'")]
    MissingComponent {
        entity: entity::EntityId,
        component: String,
    },

    /// The same component type appears more than once in one bundle or
    /// query.
    #[error("component type '{component}' given more than once")]
    DuplicateComponentType { component: String },

    /// Two different types were declared under one name.
    #[error("component name '{name}' is already declared for another type")]
    DuplicateComponentName { name: String },

    /// A component type was used that has not been declared.
    #[error("component type '{name}' not declared. Declared components: [{registered}]")]
    UnknownComponent { name: String, registered: String },

    /// No entity was created with this id.
    #[error("entity {entity} does not exist")]
    UnknownEntity { entity: entity::EntityId },

    /// A column holds a different type than requested. Indicates a broken
    /// internal invariant.
    #[error("column type mismatch: requested '{requested}', stored '{stored}'")]
    ColumnTypeMismatch {
        requested: &'static str,
        stored: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentInfo, ComponentRegistry, ComponentTypeId};
    pub use crate::entity::{EntityId, EntityRecord};
    pub use crate::keyword::{Keyword, ValuePool};
    pub use crate::pool::{Handle, ResourcePool};
    pub use crate::query::{ComponentSet, Modify, Query, QueryIter};
    pub use crate::storage::{Column, SlotIndex};
    pub use crate::world::{Bundle, World, WorldBuilder};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
