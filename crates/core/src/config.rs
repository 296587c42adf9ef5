//! Session configuration injected by the front-end.

use crate::types::START_LEVEL_COUNT;

/// Externally persisted values a session starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameConfig {
    /// Level a new game starts at (0-19)
    pub start_level: u32,
    /// Manual drops move the piece to its landing row without locking it
    pub hard_drops: bool,
    /// Best score so far
    pub high_score: u32,
}

impl GameConfig {
    /// Wrap an out-of-range start level back into 0-19
    pub fn normalized(self) -> Self {
        Self {
            start_level: self.start_level % START_LEVEL_COUNT,
            ..self
        }
    }
}

/// Wrap a signed start level into 0-19 (e.g. -1 becomes 19)
pub fn wrap_start_level(level: i64) -> u32 {
    level.rem_euclid(i64::from(START_LEVEL_COUNT)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_wraps_start_level() {
        let config = GameConfig {
            start_level: 23,
            ..GameConfig::default()
        };
        assert_eq!(config.normalized().start_level, 3);
    }

    #[test]
    fn test_wrap_start_level_handles_negatives() {
        assert_eq!(wrap_start_level(-1), 19);
        assert_eq!(wrap_start_level(20), 0);
        assert_eq!(wrap_start_level(7), 7);
    }
}
