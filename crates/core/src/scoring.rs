//! Scoring module - line-clear points, level progression and fall speed
//!
//! Scoring follows the classic table `[40, 100, 300, 1300] * (level + 1)`.
//! A level-up needs `10 * (level - start_level + 1)` accumulated lines, so
//! each step takes ten lines more than the one before; the surplus carries
//! over. Levels stop at 20.

use std::time::Duration;

use crate::types::{LINES_PER_LEVEL, LINE_SCORES, MAX_LEVEL};

/// Points for clearing `lines` rows at `level`.
///
/// Returns 0 for no lines; more than four lines (only possible on hand-built
/// boards) score as four.
pub fn calculate_line_score(lines: usize, level: u32) -> u32 {
    if lines == 0 {
        return 0;
    }
    let base = LINE_SCORES[lines.min(LINE_SCORES.len()) - 1];
    base.saturating_mul(level.saturating_add(1))
}

/// Lines needed before `level` advances, for a game started at `start_level`
pub fn required_lines(level: u32, start_level: u32) -> u32 {
    LINES_PER_LEVEL.saturating_mul(level.saturating_sub(start_level).saturating_add(1))
}

/// Result of crediting a line clear against the running totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearOutcome {
    pub points: u32,
    pub score: u32,
    pub level: u32,
    pub cleared_lines: u32,
    pub leveled_up: bool,
}

/// Credit `lines` cleared rows.
///
/// Points use the level before any level-up. At most one level is gained per
/// clear.
pub fn apply_line_clear(
    lines: usize,
    score: u32,
    level: u32,
    cleared_lines: u32,
    start_level: u32,
) -> ClearOutcome {
    let points = calculate_line_score(lines, level);
    let mut outcome = ClearOutcome {
        points,
        score: score.saturating_add(points),
        level,
        cleared_lines: cleared_lines.saturating_add(lines as u32),
        leveled_up: false,
    };

    let required = required_lines(level, start_level);
    if outcome.cleared_lines >= required && level < MAX_LEVEL {
        outcome.cleared_lines -= required;
        outcome.level += 1;
        outcome.leveled_up = true;
    }

    outcome
}

/// Seconds per gravity row at `level`: `(0.8 - level/2 * 0.007) ^ (level/2)`.
///
/// `level/2` is a real division; the curve is the guideline curve slowed
/// down by half a level per level.
pub fn fall_interval_secs(level: u32) -> f64 {
    let half = f64::from(level) / 2.0;
    (0.8 - half * 0.007).powf(half)
}

/// [`fall_interval_secs`] as a `Duration`
pub fn fall_interval(level: u32) -> Duration {
    Duration::from_secs_f64(fall_interval_secs(level))
}
