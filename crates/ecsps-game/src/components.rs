//! Component types of the demo game.
//!
//! Coordinates are screen pixels with y pointing down. Every type is
//! declared in [`new_world`]; entities get their full component set at
//! creation.

use ecsps_ecs::prelude::*;
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Draw-order layer. Lower bins are drawn first.
pub type Bin = u16;

/// Position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
}

impl Transform {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
        }
    }
}

/// Which sprite to draw and in which layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub name: Keyword,
    pub bin: Bin,
}

impl Sprite {
    pub fn new(name: &str, bin: Bin) -> Self {
        Self {
            name: Keyword::new(name),
            bin,
        }
    }
}

/// Normalized rectangle of the output surface, `[0, 1]` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Viewport {
    /// The whole surface.
    pub const FULL: Viewport = Viewport {
        origin: Vec2::ZERO,
        size: Vec2::ONE,
    };
}

/// A camera. Every view renders the whole scene into its viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub viewport: Viewport,
}

/// Axis-aligned collision box. `anchor` is the offset from the box's
/// top-left corner to the entity position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub size: Vec2,
    pub anchor: Vec2,
}

impl Collider {
    /// World-space box of this collider at `position`.
    pub fn aabb(&self, position: Vec2) -> Aabb {
        let min = position - self.anchor;
        Aabb {
            min,
            max: min + self.size,
        }
    }
}

/// World-space axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Strict overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Overlap deeper than `slop` on both axes.
    pub fn penetrates(&self, other: &Aabb, slop: f32) -> bool {
        self.min.x + slop < other.max.x
            && other.min.x + slop < self.max.x
            && self.min.y + slop < other.max.y
            && other.min.y + slop < self.max.y
    }
}

/// Dynamic body state, integrated by the physics system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    pub velocity: Vec2,
    /// Acceleration accumulated for the next step; cleared after each step.
    pub force: Vec2,
    /// Whether the body rested on a static collider after the last step.
    pub grounded: bool,
}

/// Marks an immovable collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaticBody;

/// Frame sequence cycled onto the entity's [`Sprite`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub frames: Vec<Keyword>,
    /// Frames per second.
    pub fps: f32,
    /// Seconds since the animation started.
    pub elapsed: f32,
    pub looping: bool,
}

impl Animation {
    pub fn looping(frames: &[&str], fps: f32) -> Self {
        Self {
            frames: frames.iter().map(|f| Keyword::new(f)).collect(),
            fps,
            elapsed: 0.0,
            looping: true,
        }
    }

    /// Index of the frame shown at `elapsed`, or `None` without frames.
    ///
    /// Looping animations wrap around; others hold the last frame.
    pub fn frame_index(&self) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let step = (self.elapsed.max(0.0) * self.fps.max(0.0)) as usize;
        let last = self.frames.len() - 1;
        Some(if self.looping {
            step % self.frames.len()
        } else {
            step.min(last)
        })
    }

    pub fn current_frame(&self) -> Option<&Keyword> {
        self.frame_index().map(|i| &self.frames[i])
    }
}

/// Player movement tuning, read by the input system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerControl {
    /// Horizontal speed in px/s.
    pub speed: f32,
    /// Initial upward speed of a jump in px/s.
    pub jump_speed: f32,
}

/// Offset of a sprite's origin from its top-left corner, in texture pixels.
pub type Anchor = IVec2;

/// A world with every demo component type declared.
pub fn new_world() -> Result<World, EcsError> {
    World::builder()
        .register::<Transform>("transform")
        .register::<Sprite>("sprite")
        .register::<View>("view")
        .register::<Collider>("collider")
        .register::<Body>("body")
        .register::<StaticBody>("static_body")
        .register::<Animation>("animation")
        .register::<PlayerControl>("player_control")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_animation_wraps() {
        let mut anim = Animation::looping(&["a", "b", "c"], 10.0);
        assert_eq!(anim.frame_index(), Some(0));
        anim.elapsed = 0.25;
        assert_eq!(anim.frame_index(), Some(2));
        anim.elapsed = 0.35;
        assert_eq!(anim.frame_index(), Some(0));
        assert_eq!(anim.current_frame().unwrap().as_str(), "a");
    }

    #[test]
    fn one_shot_animation_holds_last_frame() {
        let mut anim = Animation::looping(&["a", "b"], 4.0);
        anim.looping = false;
        anim.elapsed = 10.0;
        assert_eq!(anim.frame_index(), Some(1));
    }

    #[test]
    fn empty_animation_has_no_frame() {
        let anim = Animation::looping(&[], 12.0);
        assert_eq!(anim.frame_index(), None);
    }

    #[test]
    fn collider_box_uses_anchor() {
        let collider = Collider {
            size: Vec2::new(64.0, 128.0),
            anchor: Vec2::new(32.0, 128.0),
        };
        let aabb = collider.aabb(Vec2::new(100.0, 500.0));
        assert_eq!(aabb.min, Vec2::new(68.0, 372.0));
        assert_eq!(aabb.max, Vec2::new(132.0, 500.0));
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Aabb { min: Vec2::ZERO, max: Vec2::splat(10.0) };
        let b = Aabb { min: Vec2::new(10.0, 0.0), max: Vec2::new(20.0, 10.0) };
        let c = Aabb { min: Vec2::splat(5.0), max: Vec2::splat(15.0) };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));

        let grazing = Aabb { min: Vec2::new(9.9999, 0.0), max: Vec2::new(20.0, 10.0) };
        assert!(a.overlaps(&grazing));
        assert!(!a.penetrates(&grazing, 1e-3));
        assert!(a.penetrates(&c, 1e-3));
    }

    #[test]
    fn world_declares_all_types() {
        let world = new_world().unwrap();
        assert_eq!(world.registry().len(), 8);
        assert!(world.registry().lookup_by_name("sprite").is_some());
    }
}
