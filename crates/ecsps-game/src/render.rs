//! Sprite rendering onto an abstract [`Canvas`].
//!
//! Each frame the [`RenderSystem`] clears the canvas, then for every entity
//! with a [`View`] sets the viewport and draws every `(Transform, Sprite)`
//! entity bin by bin: bins ascend, and within a bin entities keep creation
//! order. Sprite names resolve through the table loaded by
//! [`load_sprites`](RenderSystem::load_sprites); unknown names are skipped
//! with a warning.

use std::collections::HashMap;
use std::sync::Arc;

use ecsps_ecs::prelude::*;
use glam::Vec2;

use crate::components::{Anchor, Bin, Sprite, Transform, View, Viewport};
use crate::error::AssetError;
use crate::sprites::SpriteDesc;
use crate::texture::{TextureHandle, TexturePool};

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// One sprite draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub entity: EntityId,
    pub sprite: Keyword,
    /// Texture key in the pool.
    pub texture: String,
    pub position: Vec2,
    pub origin: Anchor,
    pub mirror: bool,
    pub bin: Bin,
}

/// A drawing surface.
pub trait Canvas {
    fn clear(&mut self);
    fn set_viewport(&mut self, viewport: Viewport);
    fn draw(&mut self, call: &DrawCall);
    /// Finish the frame.
    fn present(&mut self);
}

/// Everything drawn during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Draw calls grouped by the viewport they were issued under.
    pub passes: Vec<(Viewport, Vec<DrawCall>)>,
}

impl Frame {
    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|(_, calls)| calls.len()).sum()
    }
}

/// A [`Canvas`] that records frames instead of drawing them.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    current: Frame,
    frames: Vec<Frame>,
    /// Keep at most this many presented frames; `None` keeps all.
    retain: Option<usize>,
    presented: u64,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep the last `count` presented frames.
    pub fn retaining(count: usize) -> Self {
        Self {
            retain: Some(count),
            ..Self::default()
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Frames presented since creation, including dropped ones.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self) {
        self.current = Frame::default();
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.current.passes.push((viewport, Vec::new()));
    }

    fn draw(&mut self, call: &DrawCall) {
        if self.current.passes.is_empty() {
            self.current.passes.push((Viewport::FULL, Vec::new()));
        }
        if let Some((_, calls)) = self.current.passes.last_mut() {
            calls.push(call.clone());
        }
    }

    fn present(&mut self) {
        self.frames.push(std::mem::take(&mut self.current));
        self.presented += 1;
        if let Some(limit) = self.retain {
            let excess = self.frames.len().saturating_sub(limit);
            self.frames.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// RenderSystem
// ---------------------------------------------------------------------------

/// A sprite with its texture loaded.
#[derive(Debug, Clone)]
struct LoadedSprite {
    texture: TextureHandle,
    anchor: Anchor,
    mirror: bool,
}

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub views: usize,
    pub draw_calls: usize,
    /// Sprites skipped because their name was never loaded.
    pub skipped: usize,
}

/// Draws every sprite entity into every view.
pub struct RenderSystem {
    textures: Arc<TexturePool>,
    sprites: HashMap<Keyword, LoadedSprite>,
}

impl RenderSystem {
    pub fn new(textures: Arc<TexturePool>) -> Self {
        Self {
            textures,
            sprites: HashMap::new(),
        }
    }

    /// Load the textures of `descs` and make their names drawable.
    ///
    /// A later description replaces an earlier one with the same name.
    pub fn load_sprites(&mut self, descs: &[SpriteDesc]) -> Result<(), AssetError> {
        for desc in descs {
            let texture = self.textures.get(desc.texture.as_str())?;
            self.sprites.insert(
                desc.name.clone(),
                LoadedSprite {
                    texture,
                    anchor: desc.anchor,
                    mirror: desc.mirror,
                },
            );
        }
        tracing::debug!(
            sprites = self.sprites.len(),
            textures = self.textures.len(),
            "loaded sprites"
        );
        Ok(())
    }

    /// Whether `name` was loaded.
    pub fn has_sprite(&self, name: &Keyword) -> bool {
        self.sprites.contains_key(name)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Draw one frame of `world` onto `canvas`.
    pub fn render(&self, world: &World, canvas: &mut dyn Canvas) -> Result<RenderStats, EcsError> {
        let mut stats = RenderStats::default();
        let mut drawables: Vec<(EntityId, &Transform, &Sprite)> = Vec::new();
        world
            .query::<(Transform, Sprite)>()?
            .for_each(|entity, (transform, sprite)| drawables.push((entity, transform, sprite)))?;
        // Stable: creation order is kept within a bin.
        drawables.sort_by_key(|(_, _, sprite)| sprite.bin);

        canvas.clear();
        for row in world.query::<(View,)>()?.iter() {
            let (_, (view,)) = row?;
            stats.views += 1;
            canvas.set_viewport(view.viewport);
            for (entity, transform, sprite) in &drawables {
                let Some(loaded) = self.sprites.get(&sprite.name) else {
                    tracing::warn!(%entity, sprite = %sprite.name, "skipping unknown sprite");
                    stats.skipped += 1;
                    continue;
                };
                canvas.draw(&DrawCall {
                    entity: *entity,
                    sprite: sprite.name.clone(),
                    texture: loaded.texture.key().clone(),
                    position: transform.position,
                    origin: loaded.anchor,
                    mirror: loaded.mirror,
                    bin: sprite.bin,
                });
                stats.draw_calls += 1;
            }
        }
        canvas.present();
        Ok(stats)
    }
}

impl std::fmt::Debug for RenderSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSystem")
            .field("sprites", &self.sprites.len())
            .field("textures", &self.textures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::new_world;
    use crate::texture::{texture_pool, TextureSource};

    fn system() -> RenderSystem {
        let mut render = RenderSystem::new(texture_pool(TextureSource::Placeholder));
        render
            .load_sprites(&[
                SpriteDesc::new("bg", "bg.png", (0, 0)),
                SpriteDesc::new("hero", "hero.png", (64, 128)),
                SpriteDesc::new("tile", "tile.png", (0, 0)),
            ])
            .unwrap();
        render
    }

    #[test]
    fn draws_bins_in_ascending_order_then_creation_order() {
        let mut world = new_world().unwrap();
        let hero = world.create_entity((Sprite::new("hero", 3), Transform::at(1.0, 0.0))).unwrap();
        let t1 = world.create_entity((Sprite::new("tile", 1), Transform::at(2.0, 0.0))).unwrap();
        let bg = world.create_entity((Sprite::new("bg", 0), Transform::at(0.0, 0.0))).unwrap();
        let t2 = world.create_entity((Sprite::new("tile", 1), Transform::at(3.0, 0.0))).unwrap();
        world.create_entity((View { viewport: Viewport::FULL },)).unwrap();

        let mut canvas = RecordingCanvas::new();
        let stats = system().render(&world, &mut canvas).unwrap();
        assert_eq!(stats, RenderStats { views: 1, draw_calls: 4, skipped: 0 });

        let frame = canvas.last_frame().unwrap();
        let order: Vec<_> = frame.passes[0].1.iter().map(|c| c.entity).collect();
        assert_eq!(order, vec![bg, t1, t2, hero]);
        assert_eq!(frame.passes[0].1[3].origin, Anchor::new(64, 128));
    }

    #[test]
    fn every_view_gets_the_whole_scene() {
        let mut world = new_world().unwrap();
        world.create_entity((Sprite::new("bg", 0), Transform::default())).unwrap();
        let left = Viewport { origin: Vec2::ZERO, size: Vec2::new(0.5, 1.0) };
        let right = Viewport { origin: Vec2::new(0.5, 0.0), size: Vec2::new(0.5, 1.0) };
        world.create_entity((View { viewport: left },)).unwrap();
        world.create_entity((View { viewport: right },)).unwrap();

        let mut canvas = RecordingCanvas::new();
        let stats = system().render(&world, &mut canvas).unwrap();
        assert_eq!(stats.views, 2);
        assert_eq!(stats.draw_calls, 2);
        let frame = canvas.last_frame().unwrap();
        assert_eq!(frame.passes.len(), 2);
        assert_eq!(frame.passes[1].0, right);
    }

    #[test]
    fn unknown_sprite_is_skipped() {
        let mut world = new_world().unwrap();
        world.create_entity((Sprite::new("ghost", 0), Transform::default())).unwrap();
        world.create_entity((Sprite::new("bg", 0), Transform::default())).unwrap();
        world.create_entity((View { viewport: Viewport::FULL },)).unwrap();

        let mut canvas = RecordingCanvas::new();
        let stats = system().render(&world, &mut canvas).unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn no_view_presents_an_empty_frame() {
        let mut world = new_world().unwrap();
        world.create_entity((Sprite::new("bg", 0), Transform::default())).unwrap();
        let mut canvas = RecordingCanvas::new();
        let stats = system().render(&world, &mut canvas).unwrap();
        assert_eq!(stats.draw_calls, 0);
        assert_eq!(canvas.presented(), 1);
        assert_eq!(canvas.last_frame().unwrap().draw_count(), 0);
    }

    #[test]
    fn retaining_canvas_drops_old_frames() {
        let mut canvas = RecordingCanvas::retaining(2);
        for _ in 0..5 {
            canvas.clear();
            canvas.present();
        }
        assert_eq!(canvas.frames().len(), 2);
        assert_eq!(canvas.presented(), 5);
    }
}
