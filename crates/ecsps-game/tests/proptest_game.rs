//! Property tests for the game loop and physics.
//!
//! Any scripted input must replay to the same state hash, and a body resting
//! on the floor must stay grounded on every tick for any usable time step.

use ecsps_game::prelude::*;
use ecsps_game::scene::GROUND_Y;
use glam::Vec2;
use proptest::prelude::*;

fn input_state_strategy() -> impl Strategy<Value = InputState> {
    (any::<bool>(), any::<bool>(), any::<bool>())
        .prop_map(|(left, right, jump)| InputState { left, right, jump })
}

fn input_script_strategy() -> impl Strategy<Value = InputScript> {
    prop::collection::vec((0..300u64, input_state_strategy()), 0..12).prop_map(InputScript::new)
}

fn run_hash(script: &InputScript, ticks: u64) -> String {
    let (mut game, _) = GameLoop::demo(&GameConfig::default()).unwrap();
    let mut canvas = RecordingCanvas::retaining(1);
    game.run_ticks(ticks, script, &mut canvas).unwrap();
    game.state_hash().unwrap()
}

fn resting_world(x: f32) -> (World, EntityId) {
    let mut world = new_world().unwrap();
    world
        .create_entity((
            Transform::at(0.0, GROUND_Y),
            Collider { size: Vec2::new(1280.0, 128.0), anchor: Vec2::ZERO },
            StaticBody,
        ))
        .unwrap();
    let body = world
        .create_entity((
            Transform::at(x, GROUND_Y),
            Collider { size: Vec2::new(64.0, 128.0), anchor: Vec2::new(32.0, 128.0) },
            Body::default(),
        ))
        .unwrap();
    (world, body)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn scripted_runs_replay_to_same_hash(script in input_script_strategy(), ticks in 1..300u64) {
        prop_assert_eq!(run_hash(&script, ticks), run_hash(&script, ticks));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn resting_body_is_grounded_every_tick(dt in 1e-4f32..0.05, x in 100.0f32..1100.0) {
        let (mut world, body) = resting_world(x);
        let physics = PhysicsSystem::new(Vec2::new(0.0, 980.0));

        for tick in 0..200 {
            physics.step(&mut world, dt).unwrap();
            let state = world.get::<Body>(body).unwrap();
            prop_assert!(state.grounded, "not grounded at tick {} with dt {}", tick, dt);
        }
        let y = world.get::<Transform>(body).unwrap().position.y;
        prop_assert!((y - GROUND_Y).abs() <= ecsps_game::physics::CONTACT_SLOP, "resting at {}", y);
    }
}
