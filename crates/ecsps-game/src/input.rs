//! Player input.
//!
//! Input is sampled once per tick into an [`InputState`]. The headless demo
//! replays an [`InputScript`] instead of polling devices.

use ecsps_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Body, PlayerControl};

pub const INPUT_SYSTEM_NAME: &str = "input";

/// Buttons held during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl InputState {
    /// -1, 0 or 1. Opposite buttons cancel.
    pub fn horizontal(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Input changes keyed by the tick they start at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    /// `(start_tick, state)`, sorted by tick.
    steps: Vec<(u64, InputState)>,
}

impl InputScript {
    pub fn new(mut steps: Vec<(u64, InputState)>) -> Self {
        steps.sort_by_key(|(tick, _)| *tick);
        Self { steps }
    }

    /// Walk right, jump, walk left, stop.
    pub fn demo() -> Self {
        let walk_right = InputState { right: true, ..InputState::default() };
        let walk_left = InputState { left: true, ..InputState::default() };
        Self::new(vec![
            (60, walk_right),
            (120, InputState { jump: true, ..walk_right }),
            (122, walk_right),
            (240, walk_left),
            (360, InputState::default()),
        ])
    }

    /// State in effect at `tick`: the last step starting at or before it.
    pub fn state_at(&self, tick: u64) -> InputState {
        let after = self.steps.partition_point(|(start, _)| *start <= tick);
        after
            .checked_sub(1)
            .map_or_else(InputState::default, |i| self.steps[i].1)
    }
}

/// Turns input into player body velocity.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSystem;

impl InputSystem {
    /// Apply `input` to every `(PlayerControl, Body)` entity. Jumping
    /// requires the body to be grounded.
    pub fn apply(&self, world: &mut World, input: &InputState) -> Result<usize, EcsError> {
        let direction = input.horizontal();
        world
            .modify::<(PlayerControl, Body)>()?
            .for_each(|entity, (control, body)| {
                body.velocity.x = direction * control.speed;
                if input.jump && body.grounded {
                    body.velocity.y = -control.jump_speed;
                    body.grounded = false;
                    tracing::debug!(%entity, "jump");
                }
            })
    }
}
