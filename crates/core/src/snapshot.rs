use crate::board::{TagGrid, COLS, ROWS};
use crate::game_state::Tetromino;
use crate::types::{PieceKind, Rotation, EMPTY_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl From<Tetromino> for ActiveSnapshot {
    fn from(value: Tetromino) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            x: value.pos.x,
            y: value.pos.y,
        }
    }
}

/// Everything a front-end needs to draw one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    /// Projected render grid (board, flicker rows, ghost, active piece)
    pub grid: TagGrid,
    pub active: Option<ActiveSnapshot>,
    pub score: u32,
    pub level: u32,
    pub cleared_lines: u32,
    pub start_level: u32,
    pub high_score: u32,
    pub hard_drops: bool,
    pub in_menu: bool,
    pub paused: bool,
    pub animating: bool,
    /// A spawn was blocked and the session is about to end
    pub game_over: bool,
    pub session_id: u32,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether piece intents would currently be accepted
    pub fn playable(&self) -> bool {
        !self.in_menu && !self.paused && !self.animating
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            grid: [[EMPTY_TAG; COLS]; ROWS],
            active: None,
            score: 0,
            level: 0,
            cleared_lines: 0,
            start_level: 0,
            high_score: 0,
            hard_drops: false,
            in_menu: true,
            paused: false,
            animating: false,
            game_over: false,
            session_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game_state::GameState;

    #[test]
    fn snapshot_matches_session() {
        let mut game = GameState::with_seed(GameConfig::default(), 7);
        game.new_game();

        let snap = game.snapshot();
        assert_eq!(&snap.grid, game.render_grid());
        assert_eq!(snap.active, game.active().map(ActiveSnapshot::from));
        assert_eq!(snap.session_id, 1);
        assert!(!snap.in_menu);
        assert!(snap.playable());
    }

    #[test]
    fn snapshot_into_overwrites_previous_frame() {
        let mut game = GameState::with_seed(GameConfig::default(), 7);
        game.new_game();
        let mut snap = game.snapshot();

        game.end_game();
        game.snapshot_into(&mut snap);
        assert!(snap.in_menu);
        assert!(snap.active.is_none());
        assert!(snap.grid.iter().flatten().all(|&t| t == EMPTY_TAG));
    }
}
