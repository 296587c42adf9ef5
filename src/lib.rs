//! Tray Tetris (workspace facade crate).
//!
//! Re-exports the workspace crates as `tray_tetris::{core,input,term,types}`
//! and adds the preferences store used by the binary.

pub mod settings;

pub use tray_tetris_core as core;
pub use tray_tetris_input as input;
pub use tray_tetris_term as term;
pub use tray_tetris_types as types;
