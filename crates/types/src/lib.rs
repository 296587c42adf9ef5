//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no external dependencies, so they can be used
//! by the game core, the input shaper and the terminal front-end alike.
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//! - Rows with a negative index lie above the visible board and are always free.
//!
//! # Cell Tags
//!
//! Render grids are `[[u8; 10]; 20]` where every cell holds a tag:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | 0 | empty |
//! | 1-7 | piece colour (I, J, L, O, S, T, Z) |
//! | 8 | ghost piece / flickering row |
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `LINE_CLEAR_DELAY_MS` | 800 | Flicker time before full rows are removed |
//! | `GAME_OVER_DELAY_MS` | 800 | Pause between a blocked spawn and the menu |
//! | `FLICKER_INTERVAL_MS` | 200 | Period of the flicker phase toggle |
//! | `KEY_REPEAT_DELAY_MS` | 200 | Hold time before a key starts repeating |
//! | `KEY_REPEAT_INTERVAL_MS` | 70 | Interval between key repeats |
//!
//! The fall interval depends on the level and lives in the core scoring module.
//!
//! # Examples
//!
//! ```
//! use tray_tetris_types::{Intent, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! assert_eq!(PieceKind::I.tag(), 1);
//! assert_eq!(PieceKind::from_tag(7), Some(PieceKind::Z));
//!
//! assert_eq!(Rotation::North.rotate(true), Rotation::East);
//! assert_eq!(Rotation::North.rotate(false), Rotation::West);
//!
//! assert!(Intent::MoveLeft.is_repeatable(true));
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Highest reachable level
pub const MAX_LEVEL: u32 = 20;

/// Number of selectable start levels (0..=19); adjustments wrap around this.
pub const START_LEVEL_COUNT: u32 = 20;

/// Lines needed per level step: `LINES_PER_LEVEL * (level - start_level + 1)`
pub const LINES_PER_LEVEL: u32 = 10;

/// Delay between a lock that completes rows and their removal
pub const LINE_CLEAR_DELAY_MS: u64 = 800;

/// Delay between a blocked spawn and the return to the menu
pub const GAME_OVER_DELAY_MS: u64 = 800;

/// Flicker phase toggle period while a game is running
pub const FLICKER_INTERVAL_MS: u64 = 200;

/// Initial hold delay before a repeatable key starts repeating
pub const KEY_REPEAT_DELAY_MS: u32 = 200;

/// Interval between repeats of a held key
pub const KEY_REPEAT_INTERVAL_MS: u32 = 70;

/// Line clear scoring table, indexed by `lines - 1`.
///
/// Points are multiplied by `(level + 1)`.
pub const LINE_SCORES: [u32; 4] = [40, 100, 300, 1300];

/// Tag of an empty cell
pub const EMPTY_TAG: u8 = 0;

/// Tag used for the ghost piece and for flickering rows
pub const MARKER_TAG: u8 = 8;

/// An integer (x, y) pair.
///
/// Used both as an absolute board position and as a relative shape or kick
/// offset. `y` grows downward on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coord {
    pub x: i8,
    pub y: i8,
}

impl Coord {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Component-wise sum
    pub const fn offset(self, other: Coord) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

/// The seven tetromino piece kinds
///
/// The declaration order defines the colour tag (`I` = 1 ... `Z` = 7):
/// - **I**: cyan bar
/// - **J**: blue
/// - **L**: orange
/// - **O**: yellow square
/// - **S**: green
/// - **T**: purple
/// - **Z**: red
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    /// All kinds in tag order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Colour tag written into the board when this piece locks (1-7)
    pub const fn tag(self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::J => 2,
            PieceKind::L => 3,
            PieceKind::O => 4,
            PieceKind::S => 5,
            PieceKind::T => 6,
            PieceKind::Z => 7,
        }
    }

    /// Inverse of [`PieceKind::tag`]. Returns `None` for 0 and the marker tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(PieceKind::I),
            2 => Some(PieceKind::J),
            3 => Some(PieceKind::L),
            4 => Some(PieceKind::O),
            5 => Some(PieceKind::S),
            6 => Some(PieceKind::T),
            7 => Some(PieceKind::Z),
            _ => None,
        }
    }
}

/// Rotation states, indexed 0-3.
///
/// Index `+1` is a clockwise quarter turn: North → East → South → West → North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    pub const fn index(self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Rotation for an index, wrapping modulo 4
    pub const fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Rotation::North,
            1 => Rotation::East,
            2 => Rotation::South,
            _ => Rotation::West,
        }
    }

    /// Rotate clockwise (90°)
    ///
    /// # Examples
    ///
    /// ```
    /// use tray_tetris_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub const fn rotate_cw(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Rotate counter-clockwise (-90°)
    ///
    /// # Examples
    ///
    /// ```
    /// use tray_tetris_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_ccw(), Rotation::West);
    /// assert_eq!(Rotation::East.rotate_ccw(), Rotation::North);
    /// ```
    pub const fn rotate_ccw(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// `(current + dir + 4) mod 4` with `dir` = +1 for clockwise, -1 otherwise
    pub const fn rotate(self, clockwise: bool) -> Self {
        if clockwise {
            self.rotate_cw()
        } else {
            self.rotate_ccw()
        }
    }
}

/// Discrete intents delivered to the game core.
///
/// Movement intents come from the input shaper (possibly repeated); the menu
/// intents come straight from key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Move piece one column left
    MoveLeft,
    /// Move piece one column right
    MoveRight,
    /// Rotate a quarter turn counter-clockwise
    RotateLeft,
    /// Rotate a quarter turn clockwise
    RotateRight,
    /// Manual gravity: one row down, or a hard drop in hard-drop mode
    Drop,
    /// Start a new game from the menu
    NewGame,
    /// Abandon the running game and return to the menu
    EndGame,
    Pause,
    Resume,
    TogglePause,
    /// Raise the start level (wraps 19 → 0)
    StartLevelUp,
    /// Lower the start level (wraps 0 → 19)
    StartLevelDown,
    /// Switch between soft-drop and hard-drop mode
    ToggleHardDrops,
}

impl Intent {
    /// Whether a held key bound to this intent may auto-repeat.
    ///
    /// Drops repeat only in soft-drop mode.
    pub fn is_repeatable(&self, hard_drops: bool) -> bool {
        match self {
            Intent::MoveLeft | Intent::MoveRight => true,
            Intent::Drop => !hard_drops,
            _ => false,
        }
    }
}

/// Core-side notification queued by the session and drained by collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    /// The active piece was written into the board
    PieceLocked { kind: PieceKind },
    /// Flagged rows were removed after the flicker delay
    LinesCleared { lines: u32, points: u32 },
    LevelUp { level: u32 },
    /// The session ended (blocked spawn or abandoned)
    GameOver { score: u32, new_high_score: bool },
    StartLevelChanged { start_level: u32 },
    HardDropsChanged { enabled: bool },
}

/// A cell on the game board
///
/// - `None`: Empty cell
/// - `Some(PieceKind)`: Cell filled by a locked piece of that kind
pub type Cell = Option<PieceKind>;

/// Tag of a board cell
pub fn cell_tag(cell: Cell) -> u8 {
    cell.map_or(EMPTY_TAG, PieceKind::tag)
}
