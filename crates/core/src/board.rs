//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell can be empty or filled with a piece kind.
//! Uses a flat array for cache locality and zero allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom).
//! Negative y is the space above the visible board: never out of bounds, always free.

use arrayvec::ArrayVec;

use crate::types::{cell_tag, Cell, Coord, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Number of rows, as a `usize` for array sizing
pub const ROWS: usize = BOARD_HEIGHT as usize;

/// Number of columns, as a `usize` for array sizing
pub const COLS: usize = BOARD_WIDTH as usize;

/// Row indices, ascending. Sized for the whole board so it never overflows.
pub type RowSet = ArrayVec<usize, ROWS>;

/// A 20x10 grid of cell tags (see [`crate::types`] for the tag table)
pub type TagGrid = [[u8; COLS]; ROWS];

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * COLS + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if the position is not on the visible board
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if the position is not on the visible board
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Tag of the cell at (x, y); 0 when empty or off the board
    pub fn tag_at(&self, x: i8, y: i8) -> u8 {
        self.get(x, y).map_or(0, cell_tag)
    }

    /// Whether (x, y) blocks a piece.
    ///
    /// x outside [0, 10) or y >= 20 is blocked. y < 0 is above the board and
    /// always free. Otherwise the cell blocks when it is filled.
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return true;
        }
        if y < 0 {
            return false;
        }
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= ROWS {
            return false;
        }
        let start = y * COLS;
        self.cells[start..start + COLS].iter().all(|cell| cell.is_some())
    }

    /// Check if a row has no filled cell
    pub fn is_row_empty(&self, y: usize) -> bool {
        if y >= ROWS {
            return false;
        }
        let start = y * COLS;
        self.cells[start..start + COLS].iter().all(|cell| cell.is_none())
    }

    /// Write `kind` into every given absolute cell.
    ///
    /// Cells above the board (y < 0) are dropped: a piece rotated partly out
    /// of the grid can still lock. Cells off the sides or bottom cannot come
    /// from a valid placement and are ignored as well.
    pub fn lock(&mut self, cells: &[Coord], kind: PieceKind) {
        for cell in cells {
            if cell.y >= 0 {
                self.set(cell.x, cell.y, Some(kind));
            }
        }
    }

    /// Indices of all full rows, ascending
    pub fn scan_full_rows(&self) -> RowSet {
        (0..ROWS).filter(|&y| self.is_row_full(y)).collect()
    }

    /// Remove the given rows and shift everything above them down.
    ///
    /// Rows are processed from the bottom-most upward; each removal moves the
    /// rows above it down by one (copy_within handles the overlap), and the
    /// vacated top row is cleared. Duplicates and out-of-range indices are
    /// skipped.
    pub fn collapse_rows(&mut self, rows: &[usize]) {
        let mut sorted: RowSet = rows.iter().copied().filter(|&y| y < ROWS).collect();
        sorted.sort_unstable();

        // Each collapse shifts the pending (higher) rows down by one.
        let mut shift = 0;
        let mut last = None;
        for &y in sorted.iter().rev() {
            if last == Some(y) {
                continue;
            }
            last = Some(y);

            let target = y + shift;
            self.cells.copy_within(0..target * COLS, COLS);
            self.cells[0..COLS].fill(None);
            shift += 1;
        }
    }

    /// Write the board as a tag grid
    pub fn write_tag_grid(&self, out: &mut TagGrid) {
        for (y, row) in out.iter_mut().enumerate() {
            for (x, tag) in row.iter_mut().enumerate() {
                *tag = cell_tag(self.cells[y * COLS + x]);
            }
        }
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of filled cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Fill a whole row with `kind`
    pub fn fill_row(&mut self, y: usize, kind: PieceKind) {
        if y < ROWS {
            self.cells[y * COLS..(y + 1) * COLS].fill(Some(kind));
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
