//! Key-repeat shaper for terminal environments.
//!
//! Turns held movement keys into a stream of discrete intents: the first
//! press fires immediately, repeats start after a delay and then follow a
//! fixed interval. Only horizontal moves and soft drops repeat; rotations,
//! hard drops and menu intents fire once per press.
//!
//! Supports terminals that do not emit key release events by using a timeout.

use std::time::Instant;

use arrayvec::ArrayVec;

use crate::types::{Intent, KEY_REPEAT_DELAY_MS, KEY_REPEAT_INTERVAL_MS};

/// Direction for horizontal movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalDirection {
    Left,
    Right,
    None,
}

impl HorizontalDirection {
    fn intent(self) -> Option<Intent> {
        match self {
            HorizontalDirection::Left => Some(Intent::MoveLeft),
            HorizontalDirection::Right => Some(Intent::MoveRight),
            HorizontalDirection::None => None,
        }
    }
}

/// Tracks held keys and their repeat timers.
#[derive(Debug, Clone)]
pub struct InputHandler {
    horizontal: HorizontalDirection,
    drop_held: bool,
    hard_drops: bool,
    last_key_time: Instant,
    horizontal_delay_timer: u32,
    drop_delay_timer: u32,
    horizontal_accumulator: u32,
    drop_accumulator: u32,
    repeat_delay: u32,
    repeat_interval: u32,
    key_release_timeout_ms: u32,
}

// In terminals without key-release events, a short timeout prevents a single tap
// from turning into a sustained "held" state that triggers repeats.
const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

impl InputHandler {
    pub fn new() -> Self {
        Self::with_config(KEY_REPEAT_DELAY_MS, KEY_REPEAT_INTERVAL_MS)
    }

    pub fn with_config(repeat_delay: u32, repeat_interval: u32) -> Self {
        Self {
            horizontal: HorizontalDirection::None,
            drop_held: false,
            hard_drops: false,
            last_key_time: Instant::now(),
            horizontal_delay_timer: 0,
            drop_delay_timer: 0,
            horizontal_accumulator: 0,
            drop_accumulator: 0,
            repeat_delay,
            repeat_interval: repeat_interval.max(1),
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    /// Follow the session's drop mode; hard drops never repeat.
    pub fn set_hard_drops(&mut self, enabled: bool) {
        self.hard_drops = enabled;
        self.drop_delay_timer = 0;
        self.drop_accumulator = 0;
    }

    /// Handle a key press already mapped to an intent.
    ///
    /// Returns the intent to apply now, or `None` when the press is a
    /// terminal auto-repeat of a key that is already held.
    pub fn handle_key_press(&mut self, intent: Intent) -> Option<Intent> {
        match intent {
            Intent::MoveLeft => self.press_horizontal(HorizontalDirection::Left),
            Intent::MoveRight => self.press_horizontal(HorizontalDirection::Right),
            Intent::Drop => {
                self.last_key_time = Instant::now();
                if self.drop_held {
                    None
                } else {
                    self.drop_held = true;
                    self.drop_delay_timer = 0;
                    self.drop_accumulator = 0;
                    Some(Intent::Drop)
                }
            }
            other => Some(other),
        }
    }

    fn press_horizontal(&mut self, direction: HorizontalDirection) -> Option<Intent> {
        self.last_key_time = Instant::now();
        if self.horizontal == direction {
            None
        } else {
            self.horizontal = direction;
            self.horizontal_delay_timer = 0;
            self.horizontal_accumulator = 0;
            direction.intent()
        }
    }

    pub fn handle_key_release(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft if self.horizontal == HorizontalDirection::Left => {
                self.release_horizontal();
            }
            Intent::MoveRight if self.horizontal == HorizontalDirection::Right => {
                self.release_horizontal();
            }
            Intent::Drop => self.release_drop(),
            _ => {}
        }
    }

    fn release_horizontal(&mut self) {
        self.horizontal = HorizontalDirection::None;
        self.horizontal_delay_timer = 0;
        self.horizontal_accumulator = 0;
    }

    fn release_drop(&mut self) {
        self.drop_held = false;
        self.drop_delay_timer = 0;
        self.drop_accumulator = 0;
    }

    /// Advance the repeat timers and collect the repeats that fell due.
    pub fn update(&mut self, elapsed_ms: u32) -> ArrayVec<Intent, 32> {
        let mut intents = ArrayVec::<Intent, 32>::new();

        // Auto-release when terminal does not emit release events.
        let time_since_last_key = self.last_key_time.elapsed().as_millis() as u32;
        if time_since_last_key > self.key_release_timeout_ms {
            if self.horizontal != HorizontalDirection::None {
                self.release_horizontal();
            }
            if self.drop_held {
                self.release_drop();
            }
        }

        if let Some(intent) = self.horizontal.intent() {
            let due = repeats_due(
                &mut self.horizontal_delay_timer,
                &mut self.horizontal_accumulator,
                elapsed_ms,
                self.repeat_delay,
                self.repeat_interval,
            );
            for _ in 0..due {
                let _ = intents.try_push(intent);
            }
        }

        if self.drop_held && Intent::Drop.is_repeatable(self.hard_drops) {
            let due = repeats_due(
                &mut self.drop_delay_timer,
                &mut self.drop_accumulator,
                elapsed_ms,
                self.repeat_delay,
                self.repeat_interval,
            );
            for _ in 0..due {
                let _ = intents.try_push(Intent::Drop);
            }
        }

        intents
    }

    /// Forget every held key (e.g. after focus loss).
    pub fn reset(&mut self) {
        self.release_horizontal();
        self.release_drop();
        self.last_key_time = Instant::now();
    }
}

/// Advance one key's delay timer and return how many repeats are due.
fn repeats_due(
    delay_timer: &mut u32,
    accumulator: &mut u32,
    elapsed_ms: u32,
    repeat_delay: u32,
    repeat_interval: u32,
) -> u32 {
    let prev = *delay_timer;
    *delay_timer = delay_timer.saturating_add(elapsed_ms);
    if *delay_timer < repeat_delay {
        return 0;
    }

    let excess = if prev < repeat_delay {
        *delay_timer - repeat_delay
    } else {
        elapsed_ms
    };
    *accumulator += excess;

    let due = *accumulator / repeat_interval;
    *accumulator %= repeat_interval;
    due
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn held() -> InputHandler {
        InputHandler::new().with_key_release_timeout_ms(10_000)
    }

    #[test]
    fn test_horizontal_repeats_after_delay() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        assert_eq!(ih.handle_key_press(Intent::MoveLeft), Some(Intent::MoveLeft));

        // Before the delay expires: no repeats.
        assert!(ih.update(99).is_empty());

        // Exactly at the delay: still no repeats.
        assert!(ih.update(1).is_empty());

        // First interval after the delay: one repeat.
        assert_eq!(ih.update(25).as_slice(), &[Intent::MoveLeft]);
        assert_eq!(ih.update(25).as_slice(), &[Intent::MoveLeft]);
    }

    #[test]
    fn test_default_cadence_is_200ms_then_70ms() {
        let mut ih = held();
        assert_eq!(ih.handle_key_press(Intent::MoveRight), Some(Intent::MoveRight));
        assert!(ih.update(200).is_empty());
        assert!(ih.update(69).is_empty());
        assert_eq!(ih.update(1).as_slice(), &[Intent::MoveRight]);
        assert_eq!(ih.update(140).len(), 2);
    }

    #[test]
    fn test_terminal_autorepeat_press_is_swallowed() {
        let mut ih = held();
        assert_eq!(ih.handle_key_press(Intent::MoveLeft), Some(Intent::MoveLeft));
        assert_eq!(ih.handle_key_press(Intent::MoveLeft), None);
        // Switching direction fires at once.
        assert_eq!(ih.handle_key_press(Intent::MoveRight), Some(Intent::MoveRight));
    }

    #[test]
    fn test_soft_drop_repeats() {
        let mut ih = held();
        assert_eq!(ih.handle_key_press(Intent::Drop), Some(Intent::Drop));
        assert!(ih.update(200).is_empty());
        assert_eq!(ih.update(70).as_slice(), &[Intent::Drop]);
    }

    #[test]
    fn test_hard_drop_never_repeats() {
        let mut ih = held();
        ih.set_hard_drops(true);
        assert_eq!(ih.handle_key_press(Intent::Drop), Some(Intent::Drop));
        assert_eq!(ih.handle_key_press(Intent::Drop), None);
        assert!(ih.update(2_000).is_empty());

        ih.handle_key_release(Intent::Drop);
        assert_eq!(ih.handle_key_press(Intent::Drop), Some(Intent::Drop));
    }

    #[test]
    fn test_rotation_and_menu_intents_pass_through() {
        let mut ih = held();
        assert_eq!(ih.handle_key_press(Intent::RotateLeft), Some(Intent::RotateLeft));
        assert_eq!(ih.handle_key_press(Intent::RotateLeft), Some(Intent::RotateLeft));
        assert_eq!(ih.handle_key_press(Intent::NewGame), Some(Intent::NewGame));
        assert!(ih.update(1_000).is_empty());
    }

    #[test]
    fn test_auto_release_triggers_after_timeout_without_key_release_events() {
        let mut ih = InputHandler::with_config(100, 25);
        ih.key_release_timeout_ms = 50;

        assert_eq!(ih.handle_key_press(Intent::MoveLeft), Some(Intent::MoveLeft));
        assert_eq!(ih.horizontal, HorizontalDirection::Left);

        // Simulate no key-release events by moving the last key time into the past.
        ih.last_key_time = Instant::now() - Duration::from_millis(51);

        assert!(ih.update(0).is_empty());
        assert_eq!(ih.horizontal, HorizontalDirection::None);
    }

    #[test]
    fn test_non_movement_key_does_not_extend_auto_release_timeout() {
        let mut ih = InputHandler::with_config(100, 25);
        ih.key_release_timeout_ms = 50;

        assert_eq!(ih.handle_key_press(Intent::MoveLeft), Some(Intent::MoveLeft));
        ih.last_key_time = Instant::now() - Duration::from_millis(51);
        assert_eq!(ih.handle_key_press(Intent::RotateRight), Some(Intent::RotateRight));

        assert!(ih.update(0).is_empty());
        assert_eq!(ih.horizontal, HorizontalDirection::None);
    }

    #[test]
    fn test_reset_clears_held_state_and_stops_repeats() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        assert_eq!(ih.handle_key_press(Intent::MoveLeft), Some(Intent::MoveLeft));
        assert!(!ih.update(200).is_empty(), "expected repeats before reset");

        ih.reset();
        assert!(ih.update(200).is_empty(), "reset should stop repeats");
    }
}
