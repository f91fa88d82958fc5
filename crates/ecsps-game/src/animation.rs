//! Frame selection for animated sprites.

use ecsps_ecs::prelude::*;

use crate::components::{Animation, Sprite};

pub const ANIMATION_SYSTEM_NAME: &str = "animation";

/// Advances every `(Animation, Sprite)` entity and writes the current frame
/// name into its sprite.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationSystem;

impl AnimationSystem {
    /// Advance by `dt` seconds. Returns the number of sprites whose frame
    /// changed.
    pub fn step(&self, world: &mut World, dt: f32) -> Result<usize, EcsError> {
        let mut changed = 0;
        world
            .modify::<(Animation, Sprite)>()?
            .for_each(|_, (animation, sprite)| {
                animation.elapsed += dt;
                if let Some(frame) = animation.current_frame() {
                    if *frame != sprite.name {
                        sprite.name = frame.clone();
                        changed += 1;
                    }
                }
            })?;
        Ok(changed)
    }
}
