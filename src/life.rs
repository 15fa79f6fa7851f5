use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    grid::{Generation, Grid},
    pattern::{PackedColor, Pattern},
    prelude::{
        BOARD_HEIGHT, BOARD_WIDTH, CELL_ALIVE_COLOR, CELL_DEAD_COLOR, UPDATE_INTERVAL_MS,
    },
    state::GameState,
};

/// Drives a [`Grid`] resource from shell events and a fixed timestep.
///
/// Expects `StatesPlugin` and `GameState` to be registered first. A `Grid` already present in
/// the world is kept and its size copied into [`LifeConfig`]; otherwise an empty one is sized
/// from the config. Loaded patterns must match the board's size.
pub struct LifePlugin;

impl Plugin for LifePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LifeConfig>();
        let preloaded = app
            .world()
            .get_resource::<Grid>()
            .map(|grid| (grid.width(), grid.height()));
        match preloaded {
            // the board never changes size, so the config follows it
            Some((width, height)) => {
                let mut config = app.world_mut().resource_mut::<LifeConfig>();
                config.width = width;
                config.height = height;
            }
            None => {
                let config = app.world().resource::<LifeConfig>();
                let grid = Grid::new(config.width, config.height);
                app.insert_resource(grid);
            }
        }
        let config = app.world().resource::<LifeConfig>().clone();

        let rng = match config.rng_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        app.insert_resource(Time::<Fixed>::from_duration(config.refresh_interval()))
            .insert_resource(BoardRng(rng))
            .add_event::<ToggleCell>()
            .add_event::<StepOnce>()
            .add_event::<ClearBoard>()
            .add_event::<RandomizeBoard>()
            .add_event::<LoadPattern>()
            .add_event::<SavePattern>()
            .add_event::<PatternSaved>()
            .add_event::<ToggleRunning>()
            .add_systems(
                FixedUpdate,
                advance_generation.run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (
                    handle_setup_edits.run_if(in_state(GameState::Setup)),
                    handle_clear_board,
                    handle_step_once,
                    handle_save_pattern,
                    toggle_setup_and_running,
                    log_generation,
                )
                    .chain(),
            );
    }
}

// ——> CONFIG

/// Runtime settings handed to the plugin by the shell.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// cells per row
    pub width: usize,
    /// cells per column
    pub height: usize,
    /// time between generations while running
    pub refresh_interval_ms: u64,
    pub alive_color: PackedColor,
    pub dead_color: PackedColor,
    /// seed for `RandomizeBoard`; random when absent
    pub rng_seed: Option<u64>,
}

impl LifeConfig {
    /// The stepping interval, never shorter than one millisecond.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            refresh_interval_ms: UPDATE_INTERVAL_MS,
            alive_color: CELL_ALIVE_COLOR,
            dead_color: CELL_DEAD_COLOR,
            rng_seed: None,
        }
    }
}

// ——> EVENTS

/// Flip one cell. Only honoured during setup.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleCell {
    pub row: usize,
    pub col: usize,
}

/// Advance one generation by hand.
#[derive(Event, Debug, Default, Clone, Copy)]
pub struct StepOnce;

#[derive(Event, Debug, Default, Clone, Copy)]
pub struct ClearBoard;

/// Seed every cell at random. Only honoured during setup.
#[derive(Event, Debug, Default, Clone, Copy)]
pub struct RandomizeBoard;

/// Replace the board (and colours) with a stored pattern. Only honoured during setup.
#[derive(Event, Debug, Clone)]
pub struct LoadPattern(pub Pattern);

/// Snapshot the board under a title; answered with [`PatternSaved`].
#[derive(Event, Debug, Clone)]
pub struct SavePattern {
    pub title: String,
}

/// A snapshot ready for the storage collaborator.
#[derive(Event, Debug, Clone)]
pub struct PatternSaved(pub Pattern);

#[derive(Event, Debug, Default, Clone, Copy)]
pub struct ToggleRunning;

// ——> RESOURCES

#[derive(Resource)]
struct BoardRng(fastrand::Rng);

// ——> SYSTEMS

fn advance_generation(mut grid: ResMut<Grid>) {
    grid.step();
}

fn handle_setup_edits(
    mut toggles: EventReader<ToggleCell>,
    mut randomize: EventReader<RandomizeBoard>,
    mut loads: EventReader<LoadPattern>,
    mut grid: ResMut<Grid>,
    mut config: ResMut<LifeConfig>,
    mut rng: ResMut<BoardRng>,
) {
    for LoadPattern(pattern) in loads.read() {
        match pattern.to_grid(grid.width(), grid.height()) {
            Ok(loaded) => {
                *grid = loaded;
                config.alive_color = pattern.alive_color();
                config.dead_color = pattern.dead_color();
                info!("loaded pattern {:?}", pattern.title());
            }
            Err(err) => warn!("cannot load pattern {:?}: {err}", pattern.title()),
        }
    }

    if randomize.read().count() > 0 {
        grid.randomize(&mut rng.0);
        debug!("randomized board, {} alive", grid.alive_count());
    }

    for &ToggleCell { row, col } in toggles.read() {
        if let Err(err) = grid.toggle(row, col) {
            warn!("ignoring toggle: {err}");
        }
    }
}

fn handle_clear_board(mut clears: EventReader<ClearBoard>, mut grid: ResMut<Grid>) {
    if clears.read().count() > 0 {
        grid.clear();
    }
}

fn handle_step_once(mut steps: EventReader<StepOnce>, mut grid: ResMut<Grid>) {
    for _ in steps.read() {
        grid.step();
    }
}

fn handle_save_pattern(
    mut saves: EventReader<SavePattern>,
    mut saved: EventWriter<PatternSaved>,
    grid: Res<Grid>,
    config: Res<LifeConfig>,
) {
    for SavePattern { title } in saves.read() {
        match Pattern::capture(&grid, title.as_str(), config.alive_color, config.dead_color) {
            Ok(pattern) => {
                info!("saved pattern as {}", pattern.image_filename());
                saved.send(PatternSaved(pattern));
            }
            Err(err) => warn!("cannot save pattern: {err}"),
        }
    }
}

fn toggle_setup_and_running(
    mut requests: EventReader<ToggleRunning>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    // an even number of requests in one frame cancels out
    if requests.read().count() % 2 == 1 {
        let next = state.get().toggled();
        info!("switching to {next:?}");
        next_state.set(next);
    }
}

fn log_generation(grid: Res<Grid>, mut last: Local<Option<Generation>>) {
    if *last != Some(grid.generation()) {
        *last = Some(grid.generation());
        debug!(
            "generation {}: {} alive, {} dead",
            grid.generation(),
            grid.alive_count(),
            grid.dead_count()
        );
    }
}
