//! Game state module - manages a complete game session
//!
//! This module ties together all core components: board, pieces, bag,
//! scoring and the timer scheduler. It handles intents, gravity, locking,
//! timed line clears and the game lifecycle.
//!
//! Nothing here returns an error. Rejected moves and rotations are no-ops,
//! a blocked spawn becomes a pending game over, and every intent is ignored
//! while it does not apply (menu, pause, clear animation).

use std::time::Duration;

use arrayvec::ArrayVec;

use crate::board::{Board, RowSet, TagGrid, COLS, ROWS};
use crate::config::{wrap_start_level, GameConfig};
use crate::pieces::{fits, get_shape, spawn_position, try_rotate, PieceShape};
use crate::render::{project_into, FlickerPhase};
use crate::rng::SpawnBag;
use crate::scheduler::{Scheduler, TimerEvent};
use crate::scoring::{apply_line_clear, fall_interval};
use crate::snapshot::{ActiveSnapshot, GameSnapshot};
use crate::types::*;

/// Maximum number of undrained events kept; older ones win on overflow
pub const EVENT_CAPACITY: usize = 32;

const LINE_CLEAR_DELAY: Duration = Duration::from_millis(LINE_CLEAR_DELAY_MS);
const GAME_OVER_DELAY: Duration = Duration::from_millis(GAME_OVER_DELAY_MS);
const FLICKER_INTERVAL: Duration = Duration::from_millis(FLICKER_INTERVAL_MS);

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub rotation: Rotation,
    /// Anchor; may be above the board (negative y) right after spawning
    pub pos: Coord,
}

impl Tetromino {
    /// Create a new tetromino at its spawn position
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            pos: spawn_position(kind),
        }
    }

    /// Get the shape (cell offsets) for current rotation
    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Absolute cells covered by the piece
    pub fn cells(&self) -> [Coord; 4] {
        self.shape().map(|cell| self.pos.offset(cell))
    }

    /// Check if the piece fits on the board where it is
    pub fn fits(&self, board: &Board) -> bool {
        check_placement(board, self.kind, self.pos, self.rotation)
    }

    /// How many rows the piece can fall before it would collide.
    ///
    /// 0 when it is already resting (or does not fit at all).
    pub fn lowest_offset(&self, board: &Board) -> i8 {
        let mut offset: i8 = 0;
        while check_placement(
            board,
            self.kind,
            Coord::new(self.pos.x, self.pos.y + offset + 1),
            self.rotation,
        ) {
            offset += 1;
        }
        offset
    }
}

/// The single validity predicate used by every piece mutation.
///
/// True iff every cell of the shape, placed at `pos`, has `x ∈ [0, 10)`,
/// `y < 20`, and is either above the board or on an empty cell.
pub fn check_placement(board: &Board, kind: PieceKind, pos: Coord, rotation: Rotation) -> bool {
    fits(kind, rotation, pos, |x, y| board.is_occupied(x, y))
}

/// Where the session is in its lifecycle.
///
/// Pause is tracked separately: it only freezes the fall timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No game running
    Menu,
    /// A piece is falling and accepts intents
    Falling,
    /// Full rows are flickering before removal
    Clearing,
    /// A spawn was blocked; the session returns to the menu after a delay
    GameOverPending,
}

/// Complete game session
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    active: Option<Tetromino>,
    bag: SpawnBag,
    scheduler: Scheduler,
    phase: Phase,
    paused: bool,
    flicker_rows: RowSet,
    flicker_phase: FlickerPhase,
    render_grid: TagGrid,
    score: u32,
    level: u32,
    cleared_lines: u32,
    start_level: u32,
    hard_drops: bool,
    high_score: u32,
    /// Monotonic id, incremented by every new game
    session_id: u32,
    events: ArrayVec<CoreEvent, EVENT_CAPACITY>,
}

impl GameState {
    /// Create a session in the menu, with an OS-seeded bag
    pub fn new(config: GameConfig) -> Self {
        Self::with_bag(config, SpawnBag::new())
    }

    /// Create a session with a reproducible piece sequence
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_bag(config, SpawnBag::with_seed(seed))
    }

    pub fn with_bag(config: GameConfig, bag: SpawnBag) -> Self {
        let config = config.normalized();
        Self {
            board: Board::new(),
            active: None,
            bag,
            scheduler: Scheduler::new(),
            phase: Phase::Menu,
            paused: false,
            flicker_rows: RowSet::new(),
            flicker_phase: FlickerPhase::default(),
            render_grid: [[EMPTY_TAG; COLS]; ROWS],
            score: 0,
            level: config.start_level,
            cleared_lines: 0,
            start_level: config.start_level,
            hard_drops: config.hard_drops,
            high_score: config.high_score,
            session_id: 0,
            events: ArrayVec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_in_menu(&self) -> bool {
        self.phase == Phase::Menu
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True while full rows flicker or a game over is pending
    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Clearing | Phase::GameOverPending)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Lines accumulated toward the next level-up
    pub fn cleared_lines(&self) -> u32 {
        self.cleared_lines
    }

    pub fn start_level(&self) -> u32 {
        self.start_level
    }

    pub fn hard_drops(&self) -> bool {
        self.hard_drops
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn active(&self) -> Option<Tetromino> {
        self.active
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Rows currently flagged for removal
    pub fn flicker_rows(&self) -> &[usize] {
        &self.flicker_rows
    }

    pub fn flicker_phase(&self) -> FlickerPhase {
        self.flicker_phase
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The display grid as of the last state change
    pub fn render_grid(&self) -> &TagGrid {
        &self.render_grid
    }

    /// Values the front-end persists between runs
    pub fn config(&self) -> GameConfig {
        GameConfig {
            start_level: self.start_level,
            hard_drops: self.hard_drops,
            high_score: self.high_score,
        }
    }

    /// Take and clear the queued events.
    pub fn take_events(&mut self) -> ArrayVec<CoreEvent, EVENT_CAPACITY> {
        std::mem::take(&mut self.events)
    }

    /// Queue `event`. When the queue is full the oldest event other than a
    /// game over is dropped to make room.
    fn emit(&mut self, event: CoreEvent) {
        if self.events.is_full() {
            let oldest = self
                .events
                .iter()
                .position(|e| !matches!(e, CoreEvent::GameOver { .. }))
                .unwrap_or(0);
            self.events.remove(oldest);
        }
        self.events.push(event);
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.grid = self.render_grid;
        out.active = self.active.map(ActiveSnapshot::from);
        out.score = self.score;
        out.level = self.level;
        out.cleared_lines = self.cleared_lines;
        out.start_level = self.start_level;
        out.high_score = self.high_score;
        out.hard_drops = self.hard_drops;
        out.in_menu = self.is_in_menu();
        out.paused = self.paused;
        out.animating = self.is_animating();
        out.game_over = self.phase == Phase::GameOverPending;
        out.session_id = self.session_id;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Start a new game from a clean board.
    ///
    /// Every pending timer from a previous game is cancelled first.
    pub fn new_game(&mut self) {
        self.scheduler.cancel_all();

        self.board.clear();
        self.active = None;
        self.bag.reset();
        self.flicker_rows.clear();
        self.flicker_phase = FlickerPhase::default();
        self.score = 0;
        self.cleared_lines = 0;
        self.level = self.start_level;
        self.session_id = self.session_id.wrapping_add(1);

        self.phase = Phase::Falling;
        self.paused = false;
        self.scheduler
            .schedule_repeating(TimerEvent::Flicker, FLICKER_INTERVAL);
        self.restart_fall_timer();
        self.spawn_next();
    }

    /// Leave the running game and return to the menu.
    ///
    /// Records a new high score if this session beat it. No-op in the menu.
    pub fn end_game(&mut self) {
        if self.phase == Phase::Menu {
            return;
        }
        self.scheduler.cancel_all();

        let new_high_score = self.score > self.high_score;
        if new_high_score {
            self.high_score = self.score;
        }
        self.emit(CoreEvent::GameOver {
            score: self.score,
            new_high_score,
        });

        self.board.clear();
        self.active = None;
        self.flicker_rows.clear();
        self.score = 0;
        self.cleared_lines = 0;
        self.level = self.start_level;
        self.phase = Phase::Menu;
        self.paused = false;
        self.refresh();
    }

    /// Pause or resume the fall timer. Ignored in the menu.
    pub fn pause_unpause(&mut self, pause: bool) {
        if self.phase == Phase::Menu {
            return;
        }
        if pause {
            self.scheduler.cancel(TimerEvent::Fall);
            self.paused = true;
        } else {
            self.paused = false;
            self.restart_fall_timer();
        }
    }

    /// Shift the start level by `amount`, wrapping within 0-19.
    ///
    /// Only applies in the menu.
    pub fn change_start_level(&mut self, amount: i32) {
        if self.phase != Phase::Menu {
            return;
        }
        let start_level = wrap_start_level(i64::from(self.start_level) + i64::from(amount));
        self.start_level = start_level;
        self.level = start_level;
        self.emit(CoreEvent::StartLevelChanged { start_level });
    }

    pub fn set_hard_drops(&mut self, enabled: bool) {
        if self.hard_drops == enabled {
            return;
        }
        self.hard_drops = enabled;
        self.emit(CoreEvent::HardDropsChanged { enabled });
    }

    /// Whether `kind` fits at `pos` in `rotation` on the current board
    pub fn check_placement(&self, kind: PieceKind, pos: Coord, rotation: Rotation) -> bool {
        check_placement(&self.board, kind, pos, rotation)
    }

    /// Rows the active piece can still fall (0 without an active piece)
    pub fn find_lowest_offset(&self) -> i8 {
        self.active
            .map_or(0, |active| active.lowest_offset(&self.board))
    }

    fn accepts_piece_intents(&self) -> bool {
        self.phase == Phase::Falling && !self.paused && self.active.is_some()
    }

    /// Move the active piece one column (`dir` < 0 left, > 0 right).
    ///
    /// Returns whether the piece moved. The render grid is refreshed either way.
    pub fn move_piece(&mut self, dir: i8) -> bool {
        if !self.accepts_piece_intents() {
            return false;
        }
        let Some(active) = self.active else {
            return false;
        };

        let target = Coord::new(active.pos.x + dir.signum(), active.pos.y);
        let moved = dir != 0 && self.check_placement(active.kind, target, active.rotation);
        if moved {
            self.active = Some(Tetromino {
                pos: target,
                ..active
            });
        }
        self.refresh();
        moved
    }

    /// Rotate the active piece a quarter turn (`dir` < 0 left, > 0 right).
    ///
    /// Tries the plain rotation first, then the wall kicks for the piece's
    /// kind. Returns whether the piece rotated.
    pub fn rotate_piece(&mut self, dir: i8) -> bool {
        if !self.accepts_piece_intents() {
            return false;
        }
        let Some(active) = self.active else {
            return false;
        };

        let result = if dir == 0 {
            None
        } else {
            let board = &self.board;
            try_rotate(active.kind, active.rotation, active.pos, dir > 0, |x, y| {
                board.is_occupied(x, y)
            })
        };

        if let Some((rotation, pos)) = result {
            self.active = Some(Tetromino {
                rotation,
                pos,
                ..active
            });
        }
        self.refresh();
        result.is_some()
    }

    /// Apply one gravity step.
    ///
    /// A manual step in hard-drop mode moves the piece straight to its landing
    /// row without locking and restarts the fall timer, leaving time to slide
    /// it sideways. Otherwise the piece falls one row, or locks if it cannot.
    pub fn apply_gravity(&mut self, manual: bool) {
        if !self.accepts_piece_intents() {
            return;
        }
        let Some(active) = self.active else {
            return;
        };

        if manual && self.hard_drops {
            let offset = active.lowest_offset(&self.board);
            self.active = Some(Tetromino {
                pos: Coord::new(active.pos.x, active.pos.y + offset),
                ..active
            });
            self.restart_fall_timer();
            self.refresh();
            return;
        }

        let below = Coord::new(active.pos.x, active.pos.y + 1);
        if self.check_placement(active.kind, below, active.rotation) {
            self.active = Some(Tetromino { pos: below, ..active });
            self.refresh();
        } else {
            self.lock_active();
        }
    }

    /// Write the active piece into the board, then either start the
    /// line-clear flicker or spawn the next piece.
    fn lock_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        self.board.lock(&active.cells(), active.kind);
        self.emit(CoreEvent::PieceLocked { kind: active.kind });

        let full_rows = self.board.scan_full_rows();
        if full_rows.is_empty() {
            self.spawn_next();
            return;
        }

        self.flicker_rows = full_rows;
        self.phase = Phase::Clearing;
        self.scheduler
            .schedule_once(TimerEvent::ResolveClear, LINE_CLEAR_DELAY);
        self.refresh();
    }

    /// Draw the next piece and place it at its spawn position.
    ///
    /// If it does not fit, no piece is placed: the session waits out the
    /// game-over delay and then ends. Ignored in the menu.
    pub fn spawn_next(&mut self) {
        if self.phase == Phase::Menu {
            return;
        }

        let piece = Tetromino::new(self.bag.draw());
        if piece.fits(&self.board) {
            self.active = Some(piece);
            self.phase = Phase::Falling;
        } else {
            self.active = None;
            self.phase = Phase::GameOverPending;
            self.scheduler.cancel(TimerEvent::Fall);
            self.scheduler
                .schedule_once(TimerEvent::GameOver, GAME_OVER_DELAY);
        }
        self.refresh();
    }

    /// Credit and remove the flagged rows, then continue with a new piece.
    fn resolve_clear(&mut self) {
        if self.phase != Phase::Clearing {
            return;
        }

        let lines = self.flicker_rows.len();
        let outcome = apply_line_clear(
            lines,
            self.score,
            self.level,
            self.cleared_lines,
            self.start_level,
        );
        self.score = outcome.score;
        self.level = outcome.level;
        self.cleared_lines = outcome.cleared_lines;
        self.emit(CoreEvent::LinesCleared {
            lines: lines as u32,
            points: outcome.points,
        });
        if outcome.leveled_up {
            self.emit(CoreEvent::LevelUp { level: self.level });
            self.restart_fall_timer();
        }

        self.board.collapse_rows(&self.flicker_rows);
        self.flicker_rows.clear();
        self.phase = Phase::Falling;
        self.spawn_next();
    }

    /// Re-arm the fall timer at the current level's speed (unless paused).
    fn restart_fall_timer(&mut self) {
        if self.paused || self.phase == Phase::Menu {
            return;
        }
        self.scheduler
            .schedule_repeating(TimerEvent::Fall, fall_interval(self.level));
    }

    /// Advance the session clock by `elapsed`, firing every due timer in order
    pub fn tick(&mut self, elapsed: Duration) {
        let until = self.scheduler.now().saturating_add(elapsed);
        while let Some(event) = self.scheduler.pop_due(until) {
            self.handle_timer(event);
        }
        self.scheduler.advance_to(until);
    }

    fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Fall => {
                if self.phase == Phase::Falling {
                    self.apply_gravity(false);
                }
            }
            TimerEvent::Flicker => {
                self.flicker_phase = self.flicker_phase.toggled();
                self.refresh();
            }
            TimerEvent::ResolveClear => self.resolve_clear(),
            TimerEvent::GameOver => self.end_game(),
        }
    }

    /// Apply an intent from the input layer
    pub fn apply_intent(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft => {
                self.move_piece(-1);
            }
            Intent::MoveRight => {
                self.move_piece(1);
            }
            Intent::RotateLeft => {
                self.rotate_piece(-1);
            }
            Intent::RotateRight => {
                self.rotate_piece(1);
            }
            Intent::Drop => self.apply_gravity(true),
            Intent::NewGame => self.new_game(),
            Intent::EndGame => self.end_game(),
            Intent::Pause => self.pause_unpause(true),
            Intent::Resume => self.pause_unpause(false),
            Intent::TogglePause => self.pause_unpause(!self.paused),
            Intent::StartLevelUp => self.change_start_level(1),
            Intent::StartLevelDown => self.change_start_level(-1),
            Intent::ToggleHardDrops => self.set_hard_drops(!self.hard_drops),
        }
    }

    /// Edit the board directly (puzzle setups, tests), then refresh the grid
    pub fn edit_board(&mut self, edit: impl FnOnce(&mut Board)) {
        edit(&mut self.board);
        self.refresh();
    }

    /// Replace the active piece while a piece is falling.
    ///
    /// Returns false (and changes nothing) outside the falling phase or when
    /// the piece does not fit.
    pub fn place_active(&mut self, piece: Tetromino) -> bool {
        if self.phase != Phase::Falling || !piece.fits(&self.board) {
            return false;
        }
        self.active = Some(piece);
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        project_into(
            &self.board,
            self.active.as_ref(),
            &self.flicker_rows,
            self.flicker_phase,
            &mut self.render_grid,
        );
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::project;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn started(seed: u64) -> GameState {
        let mut state = GameState::with_seed(GameConfig::default(), seed);
        state.new_game();
        state
    }

    fn assert_grid_consistent(state: &GameState) {
        let expected = project(
            &state.board,
            state.active.as_ref(),
            &state.flicker_rows,
            state.flicker_phase,
        );
        assert_eq!(state.render_grid, expected);
    }

    #[test]
    fn test_new_session_is_in_menu() {
        let state = GameState::with_seed(GameConfig::default(), 1);
        assert!(state.is_in_menu());
        assert!(state.active.is_none());
        assert_eq!(state.score, 0);
        assert!(!state.scheduler.is_scheduled(TimerEvent::Fall));
    }

    #[test]
    fn test_new_game_spawns_and_starts_timers() {
        let state = started(12345);
        assert_eq!(state.phase, Phase::Falling);
        assert_eq!(state.session_id, 1);
        let active = state.active.unwrap();
        assert_eq!(active.rotation, Rotation::North);
        assert_eq!(active.pos, spawn_position(active.kind));
        assert_eq!(state.scheduler.period(TimerEvent::Fall), Some(fall_interval(0)));
        assert_eq!(state.scheduler.period(TimerEvent::Flicker), Some(FLICKER_INTERVAL));
        assert_grid_consistent(&state);
    }

    #[test]
    fn test_out_of_range_start_level_wraps() {
        let config = GameConfig {
            start_level: 45,
            ..GameConfig::default()
        };
        let state = GameState::with_seed(config, 1);
        assert_eq!(state.start_level, 5);
        assert_eq!(state.level, 5);
    }

    #[test]
    fn test_move_piece_stops_at_wall() {
        let mut state = started(12345);
        let mut moves = 0;
        while state.move_piece(-1) {
            moves += 1;
            assert!(moves <= 4);
        }
        let active = state.active.unwrap();
        assert!(active.cells().iter().any(|c| c.x == 0));
        assert!(!state.move_piece(-1));
        assert_grid_consistent(&state);
    }

    #[test]
    fn test_intents_ignored_while_paused() {
        let mut state = started(12345);
        state.pause_unpause(true);
        let before = state.active;
        assert!(!state.move_piece(1));
        assert!(!state.rotate_piece(1));
        state.apply_gravity(true);
        assert_eq!(state.active, before);
        assert!(!state.scheduler.is_scheduled(TimerEvent::Fall));
        assert!(state.scheduler.is_scheduled(TimerEvent::Flicker));
    }

    #[test]
    fn test_pause_freezes_fall_but_not_flicker() {
        let mut state = started(12345);
        state.pause_unpause(true);
        let before = state.active;
        let phase = state.flicker_phase;
        state.tick(ms(5_000));
        assert_eq!(state.active, before);
        // 25 toggles
        assert_eq!(state.flicker_phase, phase.toggled());

        state.pause_unpause(false);
        assert!(!state.paused);
        state.tick(fall_interval(0));
        assert_eq!(state.active.unwrap().pos.y, before.unwrap().pos.y + 1);
    }

    #[test]
    fn test_pause_ignored_in_menu() {
        let mut state = GameState::with_seed(GameConfig::default(), 1);
        state.pause_unpause(true);
        assert!(!state.paused);
    }

    #[test]
    fn test_rotate_left_and_right_are_inverse() {
        let mut state = started(5);
        assert!(state.place_active(Tetromino {
            kind: PieceKind::T,
            rotation: Rotation::North,
            pos: Coord::new(4, 8),
        }));
        assert!(state.rotate_piece(1));
        assert_eq!(state.active.unwrap().rotation, Rotation::East);
        assert!(state.rotate_piece(-1));
        assert_eq!(state.active.unwrap().rotation, Rotation::North);
        assert!(state.rotate_piece(-1));
        assert_eq!(state.active.unwrap().rotation, Rotation::West);
    }

    #[test]
    fn test_o_rotation_keeps_position() {
        let mut state = started(5);
        let o = Tetromino {
            kind: PieceKind::O,
            rotation: Rotation::North,
            pos: Coord::new(0, 10),
        };
        assert!(state.place_active(o));
        state.rotate_piece(1);
        assert_eq!(state.active.unwrap().pos, o.pos);
        assert_eq!(state.active.unwrap().cells(), o.cells());
    }

    #[test]
    fn test_hard_drop_mode_repositions_without_locking() {
        let config = GameConfig {
            hard_drops: true,
            ..GameConfig::default()
        };
        let mut state = GameState::with_seed(config, 9);
        state.new_game();
        state.tick(ms(300));

        let before = state.active.unwrap();
        let offset = state.find_lowest_offset();
        assert!(offset > 0);
        state.apply_gravity(true);

        let after = state.active.unwrap();
        assert_eq!(after.pos.y, before.pos.y + offset);
        assert_eq!(state.board.filled_count(), 0);
        assert_eq!(state.find_lowest_offset(), 0);
        // Fall timer restarted from the drop.
        assert_eq!(state.scheduler.remaining(TimerEvent::Fall), Some(fall_interval(0)));

        // Can still slide before the next gravity tick locks it.
        let slid = state.move_piece(1) || state.move_piece(-1);
        assert!(slid);
        assert_eq!(state.board.filled_count(), 0);

        state.tick(fall_interval(0));
        assert_eq!(state.board.filled_count(), 4);
    }

    #[test]
    fn test_soft_drop_locks_when_blocked() {
        let mut state = started(3);
        let kind = state.active.unwrap().kind;
        for _ in 0..30 {
            if state.board.filled_count() > 0 {
                break;
            }
            state.apply_gravity(true);
        }
        assert_eq!(state.board.filled_count(), 4);
        let events = state.take_events();
        assert!(events.contains(&CoreEvent::PieceLocked { kind }));
        assert!(state.active.is_some());
    }

    #[test]
    fn test_lock_with_full_row_flickers_then_clears() {
        let mut state = started(11);
        let active = state.active.unwrap();
        let landing = Tetromino {
            pos: Coord::new(active.pos.x, active.pos.y + state.find_lowest_offset()),
            ..active
        };
        let gaps: Vec<i8> = landing.cells().iter().filter(|c| c.y == 19).map(|c| c.x).collect();
        state.edit_board(|board| {
            for x in 0..10 {
                if !gaps.contains(&x) {
                    board.set(x, 19, Some(PieceKind::Z));
                }
            }
        });

        state.set_hard_drops(true);
        state.apply_gravity(true);
        state.apply_gravity(false);

        assert_eq!(state.phase, Phase::Clearing);
        assert!(state.is_animating());
        assert!(state.active.is_none());
        assert_eq!(state.flicker_rows(), &[19]);
        assert!(state.render_grid[19].iter().all(|&t| t == MARKER_TAG));

        // Intents do nothing while animating.
        assert!(!state.move_piece(1));

        state.tick(ms(200));
        assert!(state.render_grid[19].iter().all(|&t| t == EMPTY_TAG));
        assert_grid_consistent(&state);

        state.tick(ms(600));
        assert_eq!(state.phase, Phase::Falling);
        assert_eq!(state.score, 40);
        assert_eq!(state.cleared_lines, 1);
        assert_eq!(state.level, 0);
        assert!(state.flicker_rows.is_empty());
        assert!(state.active.is_some());
        assert_grid_consistent(&state);
    }

    #[test]
    fn test_level_up_restarts_fall_timer_at_new_speed() {
        let mut state = started(21);
        state.cleared_lines = 9;
        state.edit_board(|board| board.fill_row(19, PieceKind::I));
        state.active = None;
        state.flicker_rows = board_full_rows(&state.board);
        state.phase = Phase::Clearing;

        state.resolve_clear();
        assert_eq!(state.level, 1);
        assert_eq!(state.cleared_lines, 0);
        assert_eq!(state.scheduler.period(TimerEvent::Fall), Some(fall_interval(1)));
        assert!(state.take_events().contains(&CoreEvent::LevelUp { level: 1 }));
    }

    fn board_full_rows(board: &Board) -> RowSet {
        board.scan_full_rows()
    }

    #[test]
    fn test_blocked_spawn_ends_game_after_delay() {
        let mut state = started(4);
        state.score = 500;
        state.edit_board(|board| {
            for y in 0..20 {
                for x in 0..9 {
                    board.set(x, y, Some(PieceKind::L));
                }
            }
        });

        state.spawn_next();
        assert_eq!(state.phase, Phase::GameOverPending);
        assert!(state.active.is_none());
        assert!(!state.is_in_menu());

        state.tick(ms(799));
        assert!(!state.is_in_menu());
        state.tick(ms(1));
        assert!(state.is_in_menu());
        assert_eq!(state.high_score, 500);
        assert_eq!(state.score, 0);
        assert_eq!(state.board.filled_count(), 0);
        assert!(state.render_grid.iter().flatten().all(|&t| t == EMPTY_TAG));
        assert!(state.take_events().contains(&CoreEvent::GameOver {
            score: 500,
            new_high_score: true
        }));
    }

    #[test]
    fn test_full_event_queue_keeps_game_over() {
        let mut state = GameState::with_seed(GameConfig::default(), 4);
        for _ in 0..EVENT_CAPACITY + 8 {
            state.change_start_level(1);
        }
        state.new_game();
        state.edit_board(|board| {
            for y in 0..20 {
                for x in 0..9 {
                    board.set(x, y, Some(PieceKind::L));
                }
            }
        });
        state.spawn_next();
        state.tick(GAME_OVER_DELAY);
        assert!(state.is_in_menu());

        let events = state.take_events();
        assert_eq!(events.len(), EVENT_CAPACITY);
        assert!(matches!(events.last(), Some(CoreEvent::GameOver { .. })));
        // The oldest start level changes made room.
        assert_eq!(events[0], CoreEvent::StartLevelChanged { start_level: 10 });
    }

    #[test]
    fn test_tick_saturates_instead_of_overflowing() {
        let mut state = started(8);
        state.tick(Duration::MAX);
        assert!(state.is_in_menu());
        assert_eq!(state.scheduler.now(), Duration::MAX);

        // A game started at the end of time still runs.
        state.tick(ms(16));
        state.new_game();
        state.tick(ms(16));
        assert!(!state.is_in_menu());
        assert!(state.active.is_some());
    }

    #[test]
    fn test_lower_score_keeps_high_score() {
        let config = GameConfig {
            high_score: 1000,
            ..GameConfig::default()
        };
        let mut state = GameState::with_seed(config, 4);
        state.new_game();
        state.score = 999;
        state.end_game();
        assert_eq!(state.high_score, 1000);
    }

    #[test]
    fn test_end_game_cancels_pending_clear() {
        let mut state = started(8);
        state.edit_board(|board| board.fill_row(19, PieceKind::S));
        state.active = None;
        state.flicker_rows = state.board.scan_full_rows();
        state.phase = Phase::Clearing;
        state
            .scheduler
            .schedule_once(TimerEvent::ResolveClear, LINE_CLEAR_DELAY);

        state.end_game();
        state.new_game();
        state.tick(ms(800));
        assert_eq!(state.score, 0);
        assert_eq!(state.cleared_lines, 0);
    }

    #[test]
    fn test_new_game_cancels_pending_game_over() {
        let mut state = started(8);
        state.edit_board(|board| {
            for y in 0..20 {
                board.set(4, y, Some(PieceKind::J));
            }
        });
        state.spawn_next();
        assert_eq!(state.phase, Phase::GameOverPending);

        state.new_game();
        state.tick(ms(800));
        assert!(!state.is_in_menu());
        assert_eq!(state.phase, Phase::Falling);
    }

    #[test]
    fn test_change_start_level_wraps_and_only_in_menu() {
        let mut state = GameState::with_seed(GameConfig::default(), 1);
        state.change_start_level(-1);
        assert_eq!(state.start_level, 19);
        assert_eq!(state.level, 19);
        state.change_start_level(1);
        assert_eq!(state.start_level, 0);

        state.new_game();
        state.change_start_level(5);
        assert_eq!(state.start_level, 0);
    }

    #[test]
    fn test_apply_intent_toggles() {
        let mut state = GameState::with_seed(GameConfig::default(), 1);
        state.apply_intent(Intent::ToggleHardDrops);
        assert!(state.hard_drops);
        state.apply_intent(Intent::NewGame);
        state.apply_intent(Intent::TogglePause);
        assert!(state.paused);
        state.apply_intent(Intent::TogglePause);
        assert!(!state.paused);
        state.apply_intent(Intent::EndGame);
        assert!(state.is_in_menu());
    }
}
