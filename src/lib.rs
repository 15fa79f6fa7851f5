pub mod grid;
pub mod life;
pub mod pattern;
pub mod state;

pub mod prelude {
    pub use crate::grid::{Generation, Grid, GridError};
    pub use crate::life::{LifeConfig, LifePlugin};
    pub use crate::pattern::{flatten, slugify, unflatten, PackedColor, Pattern, PatternError};
    pub use crate::state::GameState;

    pub const UPDATE_INTERVAL_MS: u64 = 1000;

    pub const BOARD_WIDTH: usize = 20;
    pub const BOARD_HEIGHT: usize = 20;

    // 0 tells the shell to keep its own theme colour.
    pub const CELL_ALIVE_COLOR: PackedColor = PackedColor(0);
    pub const CELL_DEAD_COLOR: PackedColor = PackedColor(0);

    pub const IMAGE_EXTENSION: &str = "png";
    pub const DISK_EXTENSION: &str = "data";
}
