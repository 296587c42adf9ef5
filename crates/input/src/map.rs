//! Key mapping from terminal events to game intents.

use crate::types::Intent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map keyboard input to game intents.
pub fn handle_key_event(key: KeyEvent) -> Option<Intent> {
    match key.code {
        // Movement
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(Intent::MoveLeft)
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(Intent::MoveRight)
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(Intent::Drop)
        }

        // Rotation
        KeyCode::Up
        | KeyCode::Char('k')
        | KeyCode::Char('K')
        | KeyCode::Char('w')
        | KeyCode::Char('W')
        | KeyCode::Char('x')
        | KeyCode::Char('X') => Some(Intent::RotateRight),
        KeyCode::Char('z')
        | KeyCode::Char('Z')
        | KeyCode::Char('y')
        | KeyCode::Char('Y') => Some(Intent::RotateLeft),

        // Session
        KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char('N') => Some(Intent::NewGame),
        KeyCode::Esc => Some(Intent::EndGame),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Intent::TogglePause),

        // Menu settings
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Intent::StartLevelUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Intent::StartLevelDown),
        KeyCode::Char('t') | KeyCode::Char('T') => Some(Intent::ToggleHardDrops),

        _ => None,
    }
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
