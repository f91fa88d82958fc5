//! Gravity and box collision against static colliders.
//!
//! Each step:
//!
//! 1. The boxes of all `(Transform, Collider, StaticBody)` entities are
//!    snapshotted with a read-only query.
//! 2. Every `(Transform, Collider, Body)` entity integrates gravity and its
//!    accumulated force into its velocity, then moves one axis at a time. A
//!    move that ends inside a static box is pushed back to the box's edge and
//!    the velocity on that axis is zeroed.
//! 3. A body stopped while moving down, or resting on a static box within
//!    [`CONTACT_SLOP`], is grounded.
//!
//! Statics never move, so the snapshot stays valid for the whole step.
//! Dynamic bodies do not collide with each other.

use ecsps_ecs::prelude::*;
use glam::Vec2;

use crate::components::{Aabb, Body, Collider, StaticBody, Transform};

/// System name used in diagnostics.
pub const PHYSICS_SYSTEM_NAME: &str = "physics";

/// Penetration below this depth, in pixels, is treated as touching.
pub const CONTACT_SLOP: f32 = 1e-3;

/// A body stopped by a static collider during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body: EntityId,
    pub static_body: EntityId,
    /// Unit normal pointing from the static box towards the body.
    pub normal: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Integrates dynamic bodies against static colliders.
#[derive(Debug, Clone)]
pub struct PhysicsSystem {
    pub gravity: Vec2,
}

impl PhysicsSystem {
    pub fn new(gravity: Vec2) -> Self {
        Self { gravity }
    }

    /// Advance every dynamic body by `dt` seconds.
    pub fn step(&self, world: &mut World, dt: f32) -> Result<Vec<Contact>, EcsError> {
        let statics = static_boxes(world)?;
        let gravity = self.gravity;
        let mut contacts = Vec::new();

        world
            .modify::<(Transform, Collider, Body)>()?
            .for_each(|entity, (transform, collider, body)| {
                body.velocity += (gravity + body.force) * dt;
                body.force = Vec2::ZERO;
                body.grounded = false;

                for axis in [Axis::X, Axis::Y] {
                    let delta = match axis {
                        Axis::X => Vec2::new(body.velocity.x * dt, 0.0),
                        Axis::Y => Vec2::new(0.0, body.velocity.y * dt),
                    };
                    if delta == Vec2::ZERO {
                        continue;
                    }
                    transform.position += delta;
                    if let Some(contact) =
                        resolve(entity, axis, delta, &mut transform.position, collider, &statics)
                    {
                        match axis {
                            Axis::X => body.velocity.x = 0.0,
                            Axis::Y => {
                                body.velocity.y = 0.0;
                                body.grounded |= contact.normal.y < 0.0;
                            }
                        }
                        contacts.push(contact);
                    }
                }

                // Resting within the slop: no contact this tick, still supported.
                if !body.grounded
                    && body.velocity.y >= 0.0
                    && supported(collider.aabb(transform.position), &statics)
                {
                    body.velocity.y = 0.0;
                    body.grounded = true;
                }
            })?;

        if !contacts.is_empty() {
            tracing::trace!(contacts = contacts.len(), "physics contacts");
        }
        Ok(contacts)
    }
}

fn static_boxes(world: &World) -> Result<Vec<(EntityId, Aabb)>, EcsError> {
    let mut boxes = Vec::new();
    world
        .query::<(Transform, Collider, StaticBody)>()?
        .for_each(|entity, (transform, collider, _)| {
            boxes.push((entity, collider.aabb(transform.position)));
        })?;
    Ok(boxes)
}

/// Whether the bottom edge of `aabb` lies on top of a static box, within
/// `CONTACT_SLOP` either way.
fn supported(aabb: Aabb, statics: &[(EntityId, Aabb)]) -> bool {
    statics.iter().any(|(_, other)| {
        aabb.min.x + CONTACT_SLOP < other.max.x
            && other.min.x + CONTACT_SLOP < aabb.max.x
            && (aabb.max.y - other.min.y).abs() <= CONTACT_SLOP
    })
}

/// Push `position` out of the first static box it overlaps along `axis`.
fn resolve(
    entity: EntityId,
    axis: Axis,
    delta: Vec2,
    position: &mut Vec2,
    collider: &Collider,
    statics: &[(EntityId, Aabb)],
) -> Option<Contact> {
    let mut hit = None;
    for (static_entity, other) in statics {
        let aabb = collider.aabb(*position);
        if !aabb.penetrates(other, CONTACT_SLOP) {
            continue;
        }
        let normal = match axis {
            Axis::X if delta.x > 0.0 => {
                position.x -= aabb.max.x - other.min.x;
                Vec2::NEG_X
            }
            Axis::X => {
                position.x += other.max.x - aabb.min.x;
                Vec2::X
            }
            Axis::Y if delta.y > 0.0 => {
                position.y -= aabb.max.y - other.min.y;
                Vec2::NEG_Y
            }
            Axis::Y => {
                position.y += other.max.y - aabb.min.y;
                Vec2::Y
            }
        };
        hit.get_or_insert(Contact {
            body: entity,
            static_body: *static_entity,
            normal,
        });
    }
    hit
}
