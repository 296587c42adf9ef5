//! Render projection - derives the display grid from authoritative state
//!
//! Layers, bottom to top:
//! 1. placed board cells;
//! 2. rows flagged for clearing, blanked or marked depending on the flicker phase;
//! 3. the ghost piece (active shape at its landing offset), marker tag;
//! 4. the active piece in its own colour.
//!
//! Cells outside the visible board are skipped. The projection is pure: the
//! same board, piece and flicker state always give the same grid.

use crate::board::{Board, TagGrid, COLS, ROWS};
use crate::game_state::Tetromino;
use crate::types::{Coord, EMPTY_TAG, MARKER_TAG};

/// Which half of the flicker cycle flagged rows are in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlickerPhase {
    /// Flagged rows drawn with the marker tag
    #[default]
    Shown,
    /// Flagged rows drawn empty
    Hidden,
}

impl FlickerPhase {
    pub fn toggled(self) -> Self {
        match self {
            FlickerPhase::Shown => FlickerPhase::Hidden,
            FlickerPhase::Hidden => FlickerPhase::Shown,
        }
    }

    fn row_tag(self) -> u8 {
        match self {
            FlickerPhase::Shown => MARKER_TAG,
            FlickerPhase::Hidden => EMPTY_TAG,
        }
    }
}

/// Project the display grid into `out`
pub fn project_into(
    board: &Board,
    active: Option<&Tetromino>,
    flicker_rows: &[usize],
    phase: FlickerPhase,
    out: &mut TagGrid,
) {
    board.write_tag_grid(out);

    for &row in flicker_rows {
        if let Some(cells) = out.get_mut(row) {
            cells.fill(phase.row_tag());
        }
    }

    let Some(active) = active else {
        return;
    };

    let ghost = Coord::new(active.pos.x, active.pos.y + active.lowest_offset(board));
    for cell in active.shape() {
        put(out, ghost.offset(cell), MARKER_TAG);
    }
    for cell in active.cells() {
        put(out, cell, active.kind.tag());
    }
}

/// Project the display grid into a fresh array
pub fn project(
    board: &Board,
    active: Option<&Tetromino>,
    flicker_rows: &[usize],
    phase: FlickerPhase,
) -> TagGrid {
    let mut out = [[EMPTY_TAG; COLS]; ROWS];
    project_into(board, active, flicker_rows, phase, &mut out);
    out
}

fn put(out: &mut TagGrid, at: Coord, tag: u8) {
    if at.x < 0 || at.y < 0 {
        return;
    }
    if let Some(cell) = out
        .get_mut(at.y as usize)
        .and_then(|row| row.get_mut(at.x as usize))
    {
        *cell = tag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PieceKind, Rotation};

    fn piece(kind: PieceKind, x: i8, y: i8) -> Tetromino {
        Tetromino {
            kind,
            rotation: Rotation::North,
            pos: Coord::new(x, y),
        }
    }

    #[test]
    fn test_empty_board_no_piece() {
        let grid = project(&Board::new(), None, &[], FlickerPhase::Shown);
        assert!(grid.iter().flatten().all(|&t| t == EMPTY_TAG));
    }

    #[test]
    fn test_ghost_sits_on_floor_under_active() {
        let o = piece(PieceKind::O, 3, -1);
        let grid = project(&Board::new(), Some(&o), &[], FlickerPhase::Shown);

        // O occupies rows 0-1 at columns 4-5; its ghost lands on rows 18-19.
        assert_eq!(grid[0][4], PieceKind::O.tag());
        assert_eq!(grid[1][5], PieceKind::O.tag());
        assert_eq!(grid[18][4], MARKER_TAG);
        assert_eq!(grid[19][5], MARKER_TAG);
        assert_eq!(grid.iter().flatten().filter(|&&t| t == MARKER_TAG).count(), 4);
    }

    #[test]
    fn test_active_draws_over_ghost_when_landed() {
        let o = piece(PieceKind::O, 3, 17);
        let grid = project(&Board::new(), Some(&o), &[], FlickerPhase::Shown);
        assert_eq!(grid.iter().flatten().filter(|&&t| t == MARKER_TAG).count(), 0);
        assert_eq!(grid[19][4], PieceKind::O.tag());
    }

    #[test]
    fn test_flicker_rows_follow_phase() {
        let mut board = Board::new();
        board.fill_row(19, PieceKind::I);
        board.fill_row(18, PieceKind::T);

        let shown = project(&board, None, &[18, 19], FlickerPhase::Shown);
        assert!(shown[19].iter().all(|&t| t == MARKER_TAG));
        assert!(shown[18].iter().all(|&t| t == MARKER_TAG));

        let hidden = project(&board, None, &[19], FlickerPhase::Hidden);
        assert!(hidden[19].iter().all(|&t| t == EMPTY_TAG));
        assert!(hidden[18].iter().all(|&t| t == PieceKind::T.tag()));
    }

    #[test]
    fn test_projection_does_not_touch_board() {
        let board = Board::new();
        let t = piece(PieceKind::T, 3, 0);
        let before = board.clone();
        let _ = project(&board, Some(&t), &[], FlickerPhase::Shown);
        assert_eq!(board, before);
    }
}
