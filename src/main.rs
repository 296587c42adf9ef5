//! Terminal Tetris runner (default binary).
//!
//! Drives a [`GameState`] from crossterm input and wall-clock ticks, and draws
//! it with the framebuffer renderer. Preferences are loaded before the
//! terminal is taken over and written back on game over and on exit.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};

use tray_tetris::core::{GameSnapshot, GameState};
use tray_tetris::input::{handle_key_event, should_quit, InputHandler};
use tray_tetris::settings::Settings;
use tray_tetris::term::{GameView, TerminalRenderer, Viewport};
use tray_tetris::types::CoreEvent;

const TICK: Duration = Duration::from_millis(16);
const LOG_CAPACITY: usize = 64;

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tray-tetris",
    version,
    about = "Falling-block puzzle in the terminal.",
    long_about = "Falling-block puzzle in the terminal.\n\n\
        CONTROLS:\n  Left/A/H  Move left    Right/D/L  Move right   Down/S/J  Drop\n  \
        Up/W/K/X  Rotate right  Z/Y        Rotate left\n  \
        Enter/N   New game     Esc        End game     P         Pause\n  \
        +/-       Start level  T          Drop mode    Q         Quit"
)]
struct Args {
    /// Start level, 1-20 as shown in the game (wraps around).
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    start_level: Option<i64>,

    /// Manual drops jump to the landing row.
    #[arg(long, conflicts_with = "soft_drops")]
    hard_drops: bool,

    /// Manual drops move one row at a time.
    #[arg(long)]
    soft_drops: bool,

    /// Preferences file (defaults to the platform config directory).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Seed for a reproducible piece sequence.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(level) = self.start_level {
            settings.start_level = level - 1;
        }
        if self.hard_drops {
            settings.hard_drops = true;
        } else if self.soft_drops {
            settings.hard_drops = false;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings_path = args.settings.clone().unwrap_or_else(Settings::default_path);

    let mut log = Log::default();

    // Without a readable file there is nothing safe to write back over.
    let (mut settings, save_path) = match Settings::load_or_back_up(&settings_path) {
        Ok((settings, backup)) => {
            if let Some(backup) = backup {
                log.push(format!(
                    "[Settings] {} was unreadable, moved to {}",
                    settings_path.display(),
                    backup.display()
                ));
            }
            (settings, Some(settings_path.as_path()))
        }
        Err(e) => {
            log.push(format!(
                "[Settings] could not read {}: {e}; using defaults, not saving",
                settings_path.display()
            ));
            (Settings::default(), None)
        }
    };
    args.apply(&mut settings);

    let config = settings.game_config();
    let mut game = match args.seed {
        Some(seed) => GameState::with_seed(config, seed),
        None => GameState::new(config),
    };

    let mut term = TerminalRenderer::new(GameView::default());
    term.enter()?;

    let result = run(&mut term, &mut game, &mut settings, save_path, &mut log);

    // Always try to restore terminal state.
    let _ = term.exit();

    settings.update_from(game.config());
    save_settings(&settings, save_path, &mut log);
    for line in &log.lines {
        eprintln!("{line}");
    }
    result
}

fn run(
    term: &mut TerminalRenderer,
    game: &mut GameState,
    settings: &mut Settings,
    save_path: Option<&Path>,
    log: &mut Log,
) -> Result<()> {
    let mut input = InputHandler::new();
    input.set_hard_drops(game.hard_drops());

    let mut snap = GameSnapshot::default();
    let mut paused_by_focus = false;
    let mut last_tick = Instant::now();

    loop {
        // Render.
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        game.snapshot_into(&mut snap);
        term.draw(&snap, Viewport::new(w, h))?;

        // Input with timeout until next tick.
        let timeout = TICK.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match key.kind {
                    KeyEventKind::Press => {
                        if should_quit(key) {
                            return Ok(());
                        }
                        if let Some(intent) = handle_key_event(key).and_then(|i| input.handle_key_press(i)) {
                            game.apply_intent(intent);
                        }
                    }
                    KeyEventKind::Repeat => {
                        // Ignore terminal auto-repeat; the input handler repeats internally.
                    }
                    KeyEventKind::Release => {
                        if let Some(intent) = handle_key_event(key) {
                            input.handle_key_release(intent);
                        }
                    }
                },
                Event::FocusLost => {
                    if !game.is_in_menu() && !game.is_paused() {
                        game.pause_unpause(true);
                        paused_by_focus = true;
                    }
                    input.reset();
                }
                Event::FocusGained => {
                    if paused_by_focus {
                        game.pause_unpause(false);
                        paused_by_focus = false;
                    }
                }
                Event::Resize(_, _) => term.invalidate(),
                _ => {}
            }
        }

        // Tick.
        let elapsed = last_tick.elapsed();
        if elapsed >= TICK {
            last_tick = Instant::now();

            for intent in input.update(elapsed.as_millis() as u32) {
                game.apply_intent(intent);
            }
            game.tick(elapsed);
        }

        for event in game.take_events() {
            if let CoreEvent::HardDropsChanged { enabled } = event {
                input.set_hard_drops(enabled);
            }
            if let Some(line) = describe(event) {
                log.push(line);
            }
            if let CoreEvent::GameOver { .. } = event {
                paused_by_focus = false;
                settings.update_from(game.config());
                save_settings(settings, save_path, log);
            }
        }
    }
}

/// Log lines held back until the terminal is restored, since stderr shares
/// the alternate screen. Only the newest [`LOG_CAPACITY`] are kept.
#[derive(Debug, Default)]
struct Log {
    lines: VecDeque<String>,
}

impl Log {
    fn push(&mut self, line: String) {
        if self.lines.len() == LOG_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}

fn save_settings(settings: &Settings, path: Option<&Path>, log: &mut Log) {
    let Some(path) = path else {
        return;
    };
    if let Err(e) = settings.save(path) {
        log.push(format!("[Settings] could not write {}: {e}", path.display()));
    }
}

/// Log line for the events worth keeping after exit.
fn describe(event: CoreEvent) -> Option<String> {
    match event {
        CoreEvent::PieceLocked { .. } => None,
        CoreEvent::LinesCleared { lines, points } => {
            Some(format!("[Game] cleared {lines} line(s) for {points} points"))
        }
        CoreEvent::LevelUp { level } => Some(format!("[Game] level {}", level + 1)),
        CoreEvent::GameOver {
            score,
            new_high_score,
        } => Some(if new_high_score {
            format!("[Game] game over, new high score {score}")
        } else {
            format!("[Game] game over, score {score}")
        }),
        CoreEvent::StartLevelChanged { .. } | CoreEvent::HardDropsChanged { .. } => None,
    }
}
