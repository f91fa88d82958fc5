//! The demo scene: a desert backdrop, a strip of ground tiles, props and an
//! animated player standing above a floor collider.

use ecsps_ecs::prelude::*;
use glam::Vec2;

use crate::components::{
    Animation, Body, Collider, PlayerControl, Sprite, StaticBody, Transform, View, Viewport,
};
use crate::config::GameConfig;

/// Top edge of the ground, in screen pixels.
pub const GROUND_Y: f32 = 832.0;

/// Width of the demo screen.
pub const SCREEN_WIDTH: f32 = 1280.0;

/// Entities the game loop and tests refer to directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub player: EntityId,
    pub floor: EntityId,
    pub view: EntityId,
}

/// Sprite entities as `(sprite, bin, x, y)`, in creation order.
const PROPS: [(&str, u16, f32, f32); 8] = [
    ("tree", 2, 0.0, GROUND_Y),
    ("grass", 2, 256.0, GROUND_Y),
    ("cactus", 2, 1152.0, GROUND_Y),
    ("tile1", 1, 0.0, GROUND_Y),
    ("tile1", 1, 1152.0, GROUND_Y),
    ("tile2", 1, 128.0, GROUND_Y),
    ("tile3", 1, 256.0, GROUND_Y),
    ("background", 0, 0.0, 0.0),
];

/// Populate `world` with the demo scene.
///
/// The player starts in the air above the ground and falls onto the floor
/// during the first ticks.
pub fn spawn_demo_scene(world: &mut World, config: &GameConfig) -> Result<SceneHandles, EcsError> {
    let player = world.create_entity((
        Transform::at(320.0, GROUND_Y - 132.0),
        Sprite::new("idle1", 3),
        Animation::looping(&["idle1", "idle2", "idle3", "idle4"], 8.0),
        Collider {
            size: Vec2::new(64.0, 128.0),
            anchor: Vec2::new(32.0, 128.0),
        },
        Body::default(),
        PlayerControl {
            speed: config.player_speed,
            jump_speed: config.jump_speed,
        },
    ))?;

    for (name, bin, x, y) in PROPS {
        world.create_entity((Sprite::new(name, bin), Transform::at(x, y)))?;
    }

    let floor = world.create_entity((
        Transform::at(0.0, GROUND_Y),
        Collider {
            size: Vec2::new(SCREEN_WIDTH, 128.0),
            anchor: Vec2::ZERO,
        },
        StaticBody,
    ))?;

    let view = world.create_entity((View {
        viewport: Viewport::FULL,
    },))?;

    tracing::info!(entities = world.entity_count(), %player, "built demo scene");
    Ok(SceneHandles {
        player,
        floor,
        view,
    })
}
