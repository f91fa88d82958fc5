//! Headless demo -- runs the desert scene for a fixed number of ticks with
//! scripted input and prints a summary.
//!
//! Run with:
//!   cargo run --bin ecsps-demo -p ecsps-game
//!
//! The config file defaults to `ecsps.toml` in the working directory and can
//! be changed with `ECSPS_CONFIG`. A missing file runs with defaults.
//! Log level follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::Context;
use ecsps_game::prelude::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var_os("ECSPS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ecsps.toml"));
    let config = GameConfig::load_or_default(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let (mut game, scene) = GameLoop::demo(&config).context("building demo scene")?;
    let mut canvas = RecordingCanvas::retaining(1);
    let summary = game.run_ticks(config.ticks, &InputScript::demo(), &mut canvas)?;

    let player = game.world().get::<Transform>(scene.player)?;
    let hash = game.state_hash()?;
    tracing::info!(
        ticks = summary.ticks,
        sim_time = game.sim_time(),
        draw_calls = summary.draw_calls,
        skipped = summary.skipped_sprites,
        contacts = summary.contacts,
        "run complete"
    );

    println!("ticks:      {}", summary.ticks);
    println!("draw calls: {}", summary.draw_calls);
    println!("player:     ({:.2}, {:.2})", player.position.x, player.position.y);
    println!("state hash: {hash}");
    Ok(())
}
