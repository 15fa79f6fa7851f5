use std::{env, fs, time::Duration};

use anyhow::Context;
use bevy::{
    app::ScheduleRunnerPlugin,
    diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin},
    log::LogPlugin,
    prelude::*,
    state::app::StatesPlugin,
};
use torus_life::prelude::*;

/// Path to a JSON `LifeConfig`; defaults are used when unset.
const CONFIG_ENV: &str = "TORUS_LIFE_CONFIG";

fn main() -> anyhow::Result<()> {
    let mut config = match env::var(CONFIG_ENV) {
        Ok(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<LifeConfig>(&raw).with_context(|| format!("parsing {path}"))?
        }
        Err(_) => LifeConfig::default(),
    };

    // an optional pattern record to start from, otherwise a random board
    let grid = match env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            let pattern = Pattern::from_json(&raw)?;
            config.alive_color = pattern.alive_color();
            config.dead_color = pattern.dead_color();
            pattern.to_grid(config.width, config.height)?
        }
        None => {
            let mut rng = match config.rng_seed {
                Some(seed) => fastrand::Rng::with_seed(seed),
                None => fastrand::Rng::new(),
            };
            let mut grid = Grid::try_new(config.width, config.height)?;
            grid.randomize(&mut rng);
            grid
        }
    };

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / 60.0),
        )))
        .add_plugins((LogPlugin::default(), StatesPlugin))
        .add_plugins((FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin::default()))
        .insert_state(GameState::Running)
        .insert_resource(config)
        .insert_resource(grid)
        .add_plugins(LifePlugin)
        .run();

    Ok(())
}
