//! Fixed-timestep game loop.
//!
//! The [`GameLoop`] owns the [`World`] and the collaborator systems. Each
//! tick runs, in this order:
//!
//! 1. **input**: the tick's [`InputState`] sets player velocities.
//! 2. **physics**: gravity, integration and static collision.
//! 3. **animation**: frame selection onto sprites.
//! 4. **render**: one frame onto the caller's [`Canvas`].
//!
//! Every system does a full query or modify pass, sequentially. With a fixed
//! order, a fixed `dt` and scripted input, the loop is deterministic: the
//! same configuration and script give the same [`state_hash`](GameLoop::state_hash).
//!
//! # Example
//!
//! ```
//! use ecsps_game::prelude::*;
//!
//! let config = GameConfig { ticks: 30, ..GameConfig::default() };
//! let (mut game, scene) = GameLoop::demo(&config).unwrap();
//! let mut canvas = RecordingCanvas::retaining(1);
//!
//! let summary = game.run_ticks(config.ticks, &InputScript::default(), &mut canvas).unwrap();
//! assert_eq!(summary.ticks, 30);
//! assert_eq!(game.tick_count(), 30);
//! assert!(game.world().get::<Transform>(scene.player).is_ok());
//! ```

use std::time::{Duration, Instant};

use ecsps_ecs::prelude::*;
use serde::Serialize;

use crate::animation::{AnimationSystem, ANIMATION_SYSTEM_NAME};
use crate::components::{new_world, Body, Sprite, Transform};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::input::{InputScript, InputState, InputSystem, INPUT_SYSTEM_NAME};
use crate::physics::{PhysicsSystem, PHYSICS_SYSTEM_NAME};
use crate::render::{Canvas, RenderStats, RenderSystem};
use crate::scene::{spawn_demo_scene, SceneHandles};
use crate::sprites::{builtin_sprite_descs, load_sprite_descs};
use crate::texture::{texture_pool, TextureSource};

pub const RENDER_SYSTEM_NAME: &str = "render";

/// System names in execution order.
pub const SYSTEM_ORDER: [&str; 4] = [
    INPUT_SYSTEM_NAME,
    PHYSICS_SYSTEM_NAME,
    ANIMATION_SYSTEM_NAME,
    RENDER_SYSTEM_NAME,
];

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system, in execution order.
    pub system_times: Vec<(&'static str, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1 for the first tick.
    pub tick: u64,
    /// Players steered by input.
    pub steered: usize,
    pub contacts: usize,
    /// Sprites whose animation frame changed.
    pub animated: usize,
    pub render: RenderStats,
}

/// Totals over a [`GameLoop::run_ticks`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub draw_calls: usize,
    pub contacts: usize,
    pub skipped_sprites: usize,
}

// ---------------------------------------------------------------------------
// GameLoop
// ---------------------------------------------------------------------------

/// The deterministic fixed-timestep game loop.
pub struct GameLoop {
    world: World,
    input: InputSystem,
    physics: PhysicsSystem,
    animation: AnimationSystem,
    render: RenderSystem,
    /// Number of ticks executed so far.
    tick_counter: u64,
    /// Fixed time step in seconds per tick.
    fixed_dt: f64,
    last_diagnostics: TickDiagnostics,
    /// Input of the last tick.
    current_input: InputState,
}

impl GameLoop {
    /// Create a loop over `world`, drawing with `render`.
    pub fn new(world: World, render: RenderSystem, config: &GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            world,
            input: InputSystem,
            physics: PhysicsSystem::new(config.gravity()),
            animation: AnimationSystem,
            render,
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            last_diagnostics: TickDiagnostics::default(),
            current_input: InputState::default(),
        })
    }

    /// Build the demo scene and its renderer from `config`.
    ///
    /// With a sprite file configured, textures are read below
    /// `asset_root`; otherwise the built-in table is used with placeholder
    /// textures.
    pub fn demo(config: &GameConfig) -> Result<(Self, SceneHandles), GameError> {
        config.validate()?;
        let mut world = new_world()?;
        let scene = spawn_demo_scene(&mut world, config)?;

        let (descs, source) = match config.sprites_path() {
            Some(path) => (
                load_sprite_descs(&path)?,
                TextureSource::Files(config.asset_root.clone()),
            ),
            None => (builtin_sprite_descs(), TextureSource::Placeholder),
        };
        let mut render = RenderSystem::new(texture_pool(source));
        render.load_sprites(&descs)?;

        Ok((Self::new(world, render, config)?, scene))
    }

    /// Execute one tick with `input`, drawing onto `canvas`.
    pub fn tick(&mut self, input: InputState, canvas: &mut dyn Canvas) -> Result<TickReport, GameError> {
        let tick_start = Instant::now();
        let dt = self.fixed_dt as f32;
        let mut system_times = Vec::with_capacity(SYSTEM_ORDER.len());
        self.current_input = input;

        let start = Instant::now();
        let steered = self.input.apply(&mut self.world, &input)?;
        system_times.push((INPUT_SYSTEM_NAME, start.elapsed()));

        let start = Instant::now();
        let contacts = self.physics.step(&mut self.world, dt)?.len();
        system_times.push((PHYSICS_SYSTEM_NAME, start.elapsed()));

        let start = Instant::now();
        let animated = self.animation.step(&mut self.world, dt)?;
        system_times.push((ANIMATION_SYSTEM_NAME, start.elapsed()));

        let start = Instant::now();
        let render = self.render.render(&self.world, canvas)?;
        system_times.push((RENDER_SYSTEM_NAME, start.elapsed()));

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
        };

        Ok(TickReport {
            tick: self.tick_counter,
            steered,
            contacts,
            animated,
            render,
        })
    }

    /// Run `count` ticks, taking each tick's input from `script`.
    pub fn run_ticks(
        &mut self,
        count: u64,
        script: &InputScript,
        canvas: &mut dyn Canvas,
    ) -> Result<RunSummary, GameError> {
        let mut summary = RunSummary::default();
        for _ in 0..count {
            let report = self.tick(script.state_at(self.tick_counter), canvas)?;
            summary.ticks += 1;
            summary.draw_calls += report.render.draw_calls;
            summary.contacts += report.contacts;
            summary.skipped_sprites += report.render.skipped;
        }
        tracing::debug!(ticks = summary.ticks, total = self.tick_counter, "ran ticks");
        Ok(summary)
    }

    /// BLAKE3 hex digest of the simulation state.
    ///
    /// Covers the tick counter, `dt`, and every transform, body and sprite
    /// in creation order.
    pub fn state_hash(&self) -> Result<String, GameError> {
        #[derive(Serialize)]
        struct HashableState<'a> {
            tick_counter: u64,
            fixed_dt: f64,
            transforms: Vec<(EntityId, &'a Transform)>,
            bodies: Vec<(EntityId, &'a Body)>,
            sprites: Vec<(EntityId, &'a Sprite)>,
        }

        let mut state = HashableState {
            tick_counter: self.tick_counter,
            fixed_dt: self.fixed_dt,
            transforms: Vec::new(),
            bodies: Vec::new(),
            sprites: Vec::new(),
        };
        self.world
            .query::<(Transform,)>()?
            .for_each(|e, (t,)| state.transforms.push((e, t)))?;
        self.world
            .query::<(Body,)>()?
            .for_each(|e, (b,)| state.bodies.push((e, b)))?;
        self.world
            .query::<(Sprite,)>()?
            .for_each(|e, (s,)| state.sprites.push((e, s)))?;

        let json_bytes = serde_json::to_vec(&state)?;
        Ok(blake3::hash(&json_bytes).to_hex().to_string())
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulation time in seconds, `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn render_system(&self) -> &RenderSystem {
        &self.render
    }

    pub fn system_names(&self) -> &'static [&'static str] {
        &SYSTEM_ORDER
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    pub fn current_input(&self) -> &InputState {
        &self.current_input
    }
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("world", &self.world)
            .field("tick_counter", &self.tick_counter)
            .field("fixed_dt", &self.fixed_dt)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingCanvas;

    fn demo(ticks: u64) -> (GameLoop, SceneHandles) {
        GameLoop::demo(&GameConfig {
            ticks,
            ..GameConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn new_loop_starts_at_zero() {
        let (game, _) = demo(0);
        assert_eq!(game.tick_count(), 0);
        assert_eq!(game.sim_time(), 0.0);
        assert_eq!(game.system_names(), ["input", "physics", "animation", "render"]);
        assert_eq!(game.render_system().sprite_count(), 11);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GameConfig {
            fixed_dt: 0.0,
            ..GameConfig::default()
        };
        assert!(matches!(GameLoop::demo(&config), Err(GameError::Config(_))));
    }

    #[test]
    fn tick_advances_counter_and_records_diagnostics() {
        let (mut game, _) = demo(1);
        let mut canvas = RecordingCanvas::new();
        let report = game.tick(InputState::default(), &mut canvas).unwrap();

        assert_eq!(report.tick, 1);
        assert_eq!(report.steered, 1);
        assert_eq!(report.render.views, 1);
        assert_eq!(report.render.draw_calls, 9);
        assert_eq!(report.render.skipped, 0);

        let names: Vec<_> = game.last_diagnostics().system_times.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, SYSTEM_ORDER);
        assert!((game.sim_time() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn frame_draws_background_first_and_player_last() {
        let (mut game, scene) = demo(1);
        let mut canvas = RecordingCanvas::new();
        game.tick(InputState::default(), &mut canvas).unwrap();

        let calls = &canvas.last_frame().unwrap().passes[0].1;
        assert_eq!(calls.first().unwrap().sprite.as_str(), "background");
        assert_eq!(calls.last().unwrap().entity, scene.player);
        let bins: Vec<_> = calls.iter().map(|c| c.bin).collect();
        let mut sorted = bins.clone();
        sorted.sort();
        assert_eq!(bins, sorted);
    }

    #[test]
    fn state_hash_changes_as_simulation_advances() {
        let (mut game, _) = demo(1);
        let before = game.state_hash().unwrap();
        assert_eq!(before.len(), 64);
        game.tick(InputState::default(), &mut RecordingCanvas::new()).unwrap();
        assert_ne!(game.state_hash().unwrap(), before);
    }
}
