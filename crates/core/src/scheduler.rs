//! Scheduler module - virtual-time timers for a game session
//!
//! The session owns two periodic timers (fall, flicker) and two one-shot
//! delays (line-clear resolution, game over). Instead of callbacks, each timer
//! is a slot holding its next deadline on a virtual clock. The owner advances
//! the clock and pops due events one at a time, in deadline order, handling
//! each before popping the next. A handler that reschedules or cancels a timer
//! is therefore seen by every later event in the same advance.
//!
//! There is exactly one slot per [`TimerEvent`], so scheduling an event that is
//! already pending replaces it.

use std::time::Duration;

/// Shortest period a repeating timer may have
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Timers driving a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Gravity step, period depends on the level
    Fall,
    /// Flicker phase toggle
    Flicker,
    /// Remove flagged rows and credit them
    ResolveClear,
    /// Return to the menu after a blocked spawn
    GameOver,
}

impl TimerEvent {
    const COUNT: usize = 4;

    const ALL: [TimerEvent; Self::COUNT] = [
        TimerEvent::Fall,
        TimerEvent::Flicker,
        TimerEvent::ResolveClear,
        TimerEvent::GameOver,
    ];

    const fn slot(self) -> usize {
        match self {
            TimerEvent::Fall => 0,
            TimerEvent::Flicker => 1,
            TimerEvent::ResolveClear => 2,
            TimerEvent::GameOver => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    due: Duration,
    period: Option<Duration>,
}

/// Virtual clock plus one pending deadline per timer kind
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: Duration,
    slots: [Option<Timer>; TimerEvent::COUNT],
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire `event` once, `delay` from now
    pub fn schedule_once(&mut self, event: TimerEvent, delay: Duration) {
        self.slots[event.slot()] = Some(Timer {
            due: self.now.saturating_add(delay),
            period: None,
        });
    }

    /// Fire `event` every `period`, first one period from now
    pub fn schedule_repeating(&mut self, event: TimerEvent, period: Duration) {
        let period = period.max(MIN_PERIOD);
        self.slots[event.slot()] = Some(Timer {
            due: self.now.saturating_add(period),
            period: Some(period),
        });
    }

    pub fn cancel(&mut self, event: TimerEvent) {
        self.slots[event.slot()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None; TimerEvent::COUNT];
    }

    pub fn is_scheduled(&self, event: TimerEvent) -> bool {
        self.slots[event.slot()].is_some()
    }

    /// Time left until `event` fires, if it is pending
    pub fn remaining(&self, event: TimerEvent) -> Option<Duration> {
        self.slots[event.slot()].map(|t| t.due.saturating_sub(self.now))
    }

    /// Period of a repeating timer, if it is pending and repeating
    pub fn period(&self, event: TimerEvent) -> Option<Duration> {
        self.slots[event.slot()].and_then(|t| t.period)
    }

    /// Pop the earliest event due at or before `until`.
    ///
    /// The clock moves to that event's deadline. Repeating timers are re-armed
    /// one period later; one-shots are removed, as are repeating timers whose
    /// next deadline would not fit in a `Duration`. Ties go to the slot order
    /// of [`TimerEvent`].
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerEvent> {
        let (event, timer) = TimerEvent::ALL
            .into_iter()
            .filter_map(|event| self.slots[event.slot()].map(|timer| (event, timer)))
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(event, timer)| (timer.due, event.slot()))?;

        self.now = self.now.max(timer.due);
        self.slots[event.slot()] = timer.period.and_then(|period| {
            let due = timer.due.checked_add(period)?;
            Some(Timer {
                due,
                period: Some(period),
            })
        });
        Some(event)
    }

    /// Move the clock forward to `until` (never backward)
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
