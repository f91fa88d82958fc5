//! ecsps game -- a headless 2D side-scroller built on the ecsps store.
//!
//! The crate wires the [`ecsps_ecs`] world to a handful of systems driven by
//! a fixed-timestep [`GameLoop`](tick::GameLoop):
//!
//! - [`input`]: scripted button state onto player bodies
//! - [`physics`]: gravity and axis-separated AABB collision
//! - [`animation`]: frame cycling onto sprites
//! - [`render`]: bin-ordered draw calls onto a [`Canvas`](render::Canvas)
//!
//! Sprites are described by a text table ([`sprites`]) and their textures are
//! shared through a [`ResourcePool`](ecsps_ecs::pool::ResourcePool)
//! ([`texture`]). No window or GPU is involved: the bundled canvas records
//! frames so runs can be inspected and hashed.

#![deny(unsafe_code)]

pub mod animation;
pub mod components;
pub mod config;
pub mod error;
pub mod input;
pub mod physics;
pub mod render;
pub mod scene;
pub mod sprites;
pub mod texture;
pub mod tick;

pub use ecsps_ecs;

/// Convenience re-exports for the demo binary and tests.
pub mod prelude {
    pub use ecsps_ecs::prelude::*;

    pub use crate::animation::AnimationSystem;
    pub use crate::components::{
        new_world, Aabb, Animation, Body, Collider, PlayerControl, Sprite, StaticBody, Transform,
        View, Viewport,
    };
    pub use crate::config::GameConfig;
    pub use crate::error::{AssetError, ConfigError, GameError};
    pub use crate::input::{InputScript, InputState, InputSystem};
    pub use crate::physics::{Contact, PhysicsSystem};
    pub use crate::render::{Canvas, DrawCall, Frame, RecordingCanvas, RenderStats, RenderSystem};
    pub use crate::scene::{spawn_demo_scene, SceneHandles};
    pub use crate::sprites::{builtin_sprite_descs, load_sprite_descs, SpriteDesc};
    pub use crate::texture::{texture_pool, Texture, TextureHandle, TexturePool, TextureSource};
    pub use crate::tick::{GameLoop, RunSummary, TickDiagnostics, TickReport};
}
