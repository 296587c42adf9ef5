//! Pieces module - Tetromino shapes and SRS wall kick tables
//!
//! Shapes are listed per kind as four rotation states of four cells each,
//! relative to the piece anchor (top-left of its bounding box, y down).
//!
//! Kick offsets are stored y-up, the way SRS tables are usually written, and
//! are applied to the anchor as `(x + kick.x, y - kick.y)`.
//! Reference: https://tetris.wiki/SRS

use crate::types::{Coord, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};

/// Shape of a piece - 4 cell offsets from the piece anchor
pub type PieceShape = [Coord; 4];

/// Candidate kick offsets for one rotation transition, tried in order
pub type KickRow = [Coord; 4];

/// `[direction][from_rotation]`, direction 0 = counter-clockwise, 1 = clockwise
pub type KickTable = [[KickRow; 4]; 2];

const fn c(x: i8, y: i8) -> Coord {
    Coord::new(x, y)
}

const I_SHAPES: [PieceShape; 4] = [
    [c(0, 1), c(1, 1), c(2, 1), c(3, 1)],
    [c(2, 0), c(2, 1), c(2, 2), c(2, 3)],
    [c(0, 2), c(1, 2), c(2, 2), c(3, 2)],
    [c(1, 0), c(1, 1), c(1, 2), c(1, 3)],
];

const J_SHAPES: [PieceShape; 4] = [
    [c(0, 0), c(0, 1), c(1, 1), c(2, 1)],
    [c(1, 0), c(1, 1), c(1, 2), c(2, 0)],
    [c(0, 1), c(1, 1), c(2, 1), c(2, 2)],
    [c(0, 2), c(1, 0), c(1, 1), c(1, 2)],
];

const L_SHAPES: [PieceShape; 4] = [
    [c(0, 1), c(1, 1), c(2, 0), c(2, 1)],
    [c(1, 0), c(1, 1), c(1, 2), c(2, 2)],
    [c(0, 1), c(0, 2), c(1, 1), c(2, 1)],
    [c(0, 0), c(1, 0), c(1, 1), c(1, 2)],
];

// Identical in every state, one row lower than its bounding box top.
const O_SHAPES: [PieceShape; 4] = [[c(1, 1), c(1, 2), c(2, 1), c(2, 2)]; 4];

const S_SHAPES: [PieceShape; 4] = [
    [c(0, 1), c(1, 0), c(1, 1), c(2, 0)],
    [c(1, 0), c(1, 1), c(2, 1), c(2, 2)],
    [c(0, 2), c(1, 1), c(1, 2), c(2, 1)],
    [c(0, 0), c(0, 1), c(1, 1), c(1, 2)],
];

const T_SHAPES: [PieceShape; 4] = [
    [c(0, 1), c(1, 0), c(1, 1), c(2, 1)],
    [c(1, 0), c(1, 1), c(1, 2), c(2, 1)],
    [c(0, 1), c(1, 1), c(1, 2), c(2, 1)],
    [c(0, 1), c(1, 0), c(1, 1), c(1, 2)],
];

const Z_SHAPES: [PieceShape; 4] = [
    [c(0, 0), c(1, 0), c(1, 1), c(2, 1)],
    [c(1, 1), c(1, 2), c(2, 0), c(2, 1)],
    [c(0, 1), c(1, 1), c(1, 2), c(2, 2)],
    [c(0, 1), c(0, 2), c(1, 0), c(1, 1)],
];

/// Get the shape (cell offsets) for a piece kind and rotation
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    let table = match kind {
        PieceKind::I => &I_SHAPES,
        PieceKind::J => &J_SHAPES,
        PieceKind::L => &L_SHAPES,
        PieceKind::O => &O_SHAPES,
        PieceKind::S => &S_SHAPES,
        PieceKind::T => &T_SHAPES,
        PieceKind::Z => &Z_SHAPES,
    };
    table[rotation.index()]
}

/// JLSTZ kick table (shared by J, L, S, T, Z)
const JLSTZ_KICKS: KickTable = [
    // Counter-clockwise, from 0, 1, 2, 3
    [
        [c(1, 0), c(1, 1), c(0, -2), c(1, -2)],
        [c(1, 0), c(1, -1), c(0, 2), c(1, 2)],
        [c(-1, 0), c(-1, 1), c(0, -2), c(-1, -2)],
        [c(-1, 0), c(-1, -1), c(0, 2), c(-1, 2)],
    ],
    // Clockwise, from 0, 1, 2, 3
    [
        [c(-1, 0), c(-1, 1), c(0, -2), c(-1, -2)],
        [c(1, 0), c(1, -1), c(0, 2), c(1, 2)],
        [c(1, 0), c(1, 1), c(0, -2), c(1, -2)],
        [c(-1, 0), c(-1, -1), c(0, 2), c(-1, 2)],
    ],
];

/// I piece kick table (different from JLSTZ)
const I_KICKS: KickTable = [
    // Counter-clockwise, from 0, 1, 2, 3
    [
        [c(-1, 0), c(2, 0), c(-1, 2), c(2, -1)],
        [c(2, 0), c(-1, 0), c(2, 1), c(-1, -2)],
        [c(1, 0), c(-2, 0), c(1, -2), c(-2, 1)],
        [c(-2, 0), c(1, 0), c(-2, -1), c(1, 2)],
    ],
    // Clockwise, from 0, 1, 2, 3
    [
        [c(-2, 0), c(1, 0), c(-2, -1), c(1, 2)],
        [c(-1, 0), c(2, 0), c(-1, 2), c(2, -1)],
        [c(2, 0), c(-1, 0), c(2, 1), c(-1, -2)],
        [c(1, 0), c(-2, 0), c(1, -2), c(-2, 1)],
    ],
];

/// Get the kick table for a piece kind. The O piece has none.
pub fn get_kick_table(kind: PieceKind) -> Option<&'static KickTable> {
    match kind {
        PieceKind::O => None,
        PieceKind::I => Some(&I_KICKS),
        _ => Some(&JLSTZ_KICKS),
    }
}

/// Ordered kick candidates for rotating `kind` away from `from`.
///
/// Empty for the O piece.
pub fn get_kicks(kind: PieceKind, from: Rotation, clockwise: bool) -> &'static [Coord] {
    match get_kick_table(kind) {
        Some(table) => &table[usize::from(clockwise)][from.index()],
        None => &[],
    }
}

/// Whether `kind` in `rotation` fits at `pos`.
///
/// Every cell must satisfy `x ∈ [0, 10)`, `y < 20`, and either lie above the
/// board (`y < 0`) or on a free cell as reported by `is_occupied`.
pub fn fits(
    kind: PieceKind,
    rotation: Rotation,
    pos: Coord,
    is_occupied: impl Fn(i8, i8) -> bool,
) -> bool {
    get_shape(kind, rotation).iter().all(|cell| {
        let x = pos.x + cell.x;
        let y = pos.y + cell.y;
        (0..BOARD_WIDTH as i8).contains(&x)
            && y < BOARD_HEIGHT as i8
            && (y < 0 || !is_occupied(x, y))
    })
}

/// Try to rotate a piece, falling back to wall kicks.
///
/// The unkicked rotation is tried first; then, for non-O pieces, every kick
/// candidate in table order. Returns `Some((new_rotation, new_anchor))` for
/// the first placement that fits, `None` if all fail.
pub fn try_rotate(
    kind: PieceKind,
    rotation: Rotation,
    pos: Coord,
    clockwise: bool,
    is_occupied: impl Fn(i8, i8) -> bool,
) -> Option<(Rotation, Coord)> {
    let new_rotation = rotation.rotate(clockwise);

    if fits(kind, new_rotation, pos, &is_occupied) {
        return Some((new_rotation, pos));
    }

    get_kicks(kind, rotation, clockwise)
        .iter()
        .map(|kick| Coord::new(pos.x + kick.x, pos.y - kick.y))
        .find(|&candidate| fits(kind, new_rotation, candidate, &is_occupied))
        .map(|candidate| (new_rotation, candidate))
}

/// Horizontal spawn column for every kind
pub const SPAWN_X: i8 = 3;

/// Spawn anchor for a new piece.
///
/// I and O spawn one row higher because their shapes start one row lower in
/// their bounding boxes.
pub fn spawn_position(kind: PieceKind) -> Coord {
    let y = match kind {
        PieceKind::I | PieceKind::O => -1,
        _ => 0,
    };
    Coord::new(SPAWN_X, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROTATIONS: [Rotation; 4] = [
        Rotation::North,
        Rotation::East,
        Rotation::South,
        Rotation::West,
    ];

    #[test]
    fn every_shape_has_four_distinct_cells_in_a_4x4_box() {
        for kind in PieceKind::ALL {
            for rotation in ROTATIONS {
                let shape = get_shape(kind, rotation);
                for (i, a) in shape.iter().enumerate() {
                    assert!((0..4).contains(&a.x) && (0..4).contains(&a.y));
                    for b in &shape[i + 1..] {
                        assert_ne!(a, b, "{:?} {:?} repeats a cell", kind, rotation);
                    }
                }
            }
        }
    }

    #[test]
    fn o_piece_has_no_kicks() {
        assert!(get_kick_table(PieceKind::O).is_none());
        assert!(get_kicks(PieceKind::O, Rotation::North, true).is_empty());
    }

    #[test]
    fn kick_rows_are_selected_by_direction_then_rotation() {
        let cw_from_north = get_kicks(PieceKind::T, Rotation::North, true);
        assert_eq!(cw_from_north[0], Coord::new(-1, 0));
        let ccw_from_north = get_kicks(PieceKind::T, Rotation::North, false);
        assert_eq!(ccw_from_north[0], Coord::new(1, 0));
        let i_cw_from_west = get_kicks(PieceKind::I, Rotation::West, true);
        assert_eq!(i_cw_from_west[3], Coord::new(-2, 1));
    }

    #[test]
    fn fits_treats_rows_above_the_board_as_free() {
        let all_occupied = |_: i8, _: i8| true;
        // I north at y = -1 only covers row 0, which is occupied.
        assert!(!fits(PieceKind::I, Rotation::North, Coord::new(3, -1), all_occupied));
        // Entirely above the board.
        assert!(fits(PieceKind::I, Rotation::North, Coord::new(3, -2), all_occupied));
    }

    #[test]
    fn kicks_are_tried_in_order_with_y_inverted() {
        let anchor = Coord::new(3, 5);

        // East T at (3,5) covers (4,5) (4,6) (4,7) (5,6).
        let result = try_rotate(PieceKind::T, Rotation::North, anchor, true, |_, _| false);
        assert_eq!(result, Some((Rotation::East, anchor)));

        // Block the plain rotation; kick (-1, 0) moves the anchor left.
        let blocked = |x: i8, y: i8| x == 4 && y == 7;
        let result = try_rotate(PieceKind::T, Rotation::North, anchor, true, blocked);
        assert_eq!(result, Some((Rotation::East, Coord::new(2, 5))));

        // Block that too; kick (-1, +1) is applied as one row up.
        let blocked = |x: i8, y: i8| y == 7 && (x == 3 || x == 4);
        let result = try_rotate(PieceKind::T, Rotation::North, anchor, true, blocked);
        assert_eq!(result, Some((Rotation::East, Coord::new(2, 4))));
    }

    #[test]
    fn rotation_fails_when_every_kick_is_blocked() {
        let blocked = |x: i8, _: i8| x != 0;
        let result = try_rotate(PieceKind::T, Rotation::North, Coord::new(3, 5), true, blocked);
        assert_eq!(result, None);
    }

    #[test]
    fn spawn_is_one_row_higher_for_i_and_o() {
        assert_eq!(spawn_position(PieceKind::I), Coord::new(3, -1));
        assert_eq!(spawn_position(PieceKind::O), Coord::new(3, -1));
        assert_eq!(spawn_position(PieceKind::T), Coord::new(3, 0));
    }
}
