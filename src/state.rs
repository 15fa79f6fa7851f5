use bevy::prelude::*;

/// Board edits are accepted in `Setup`; the board advances on its own in `Running`.
#[derive(States, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Setup,
    Running,
}

impl GameState {
    pub fn toggled(self) -> Self {
        match self {
            GameState::Setup => GameState::Running,
            GameState::Running => GameState::Setup,
        }
    }
}
