//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules, state management, and timing.
//! It has **zero dependencies** on the terminal or any I/O, making it:
//!
//! - **Deterministic**: Same seed and same tick sequence produce identical games
//! - **Testable**: Timers run on a virtual clock advanced by the caller
//! - **Portable**: Can run in any environment (terminal, GUI, headless)
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 board of placed cells, full-row scan and collapse
//! - [`pieces`]: Tetromino shapes, SRS wall kicks and the placement predicate
//! - [`rng`]: 7-bag random piece generation
//! - [`scoring`]: Line-clear points, level progression and fall speed
//! - [`scheduler`]: Virtual-time fall, flicker, line-clear and game-over timers
//! - [`render`]: Projection of board, flicker rows, ghost and piece into a tag grid
//! - [`game_state`]: The session: intents, gravity, locking, lifecycle
//! - [`config`]: Values injected by the front-end (start level, drop mode, high score)
//!
//! # Game Rules
//!
//! - **7-Bag Randomizer**: every kind appears once per seven draws
//! - **SRS Rotation**: wall kicks for all pieces except O, both directions
//! - **Ghost Piece**: shows where the current piece will land
//! - **Drop modes**: soft drops move one row; hard drops jump to the landing
//!   row and lock on the next gravity step
//! - **Line clears**: full rows flicker for 800ms before they are removed
//! - **Scoring**: `[40, 100, 300, 1300] * (level + 1)`
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tray_tetris_core::{GameConfig, GameState};
//! use tray_tetris_types::Intent;
//!
//! let mut game = GameState::with_seed(GameConfig::default(), 12345);
//! game.apply_intent(Intent::NewGame);
//!
//! game.apply_intent(Intent::MoveRight);
//! game.apply_intent(Intent::RotateRight);
//! game.tick(Duration::from_millis(16));
//!
//! assert!(!game.is_in_menu());
//! assert_eq!(game.score(), 0);
//! ```
//!
//! # Timing
//!
//! Call [`GameState::tick`](game_state::GameState::tick) with the wall-clock
//! time elapsed since the last call. Due timers fire in deadline order:
//! - **Gravity**: `(0.8 - level/2 * 0.007) ^ (level/2)` seconds per row
//! - **Flicker**: 200ms phase toggle
//! - **Line clear / game over**: 800ms one-shot delays

pub mod board;
pub mod config;
pub mod game_state;
pub mod pieces;
pub mod render;
pub mod rng;
pub mod scheduler;
pub mod scoring;
pub mod snapshot;

pub use tray_tetris_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, RowSet, TagGrid};
pub use config::GameConfig;
pub use game_state::{check_placement, GameState, Phase, Tetromino};
pub use pieces::{get_shape, try_rotate};
pub use render::{project, FlickerPhase};
pub use rng::SpawnBag;
pub use scheduler::{Scheduler, TimerEvent};
pub use scoring::{calculate_line_score, fall_interval};
pub use snapshot::{ActiveSnapshot, GameSnapshot};
