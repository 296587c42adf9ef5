//! Terminal input module.
//!
//! Independent of any UI framework: maps `crossterm` key events into
//! [`crate::types::Intent`] and shapes held keys into timed repeats, including
//! in terminals without key-release events.

pub mod handler;
pub mod map;

pub use tray_tetris_types as types;

pub use handler::InputHandler;
pub use map::{handle_key_event, should_quit};
