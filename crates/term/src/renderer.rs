//! Snapshot-driven terminal output.
//!
//! [`TerminalRenderer::draw`] does nothing when the snapshot and viewport are
//! the ones already on screen. Otherwise the snapshot is laid out by a
//! [`GameView`] and only the spans that differ from the screen are written.
//! The first frame, and every frame after a resize or [`invalidate`], clears
//! the screen and prints everything.
//!
//! [`invalidate`]: TerminalRenderer::invalidate

use std::io::{self, Write};
use std::ops::Range;

use anyhow::Result;

use crossterm::{
    cursor,
    event::{DisableFocusChange, EnableFocusChange},
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal, QueueableCommand,
};

use crate::core::GameSnapshot;
use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};
use crate::game_view::{GameView, Viewport};

/// Unchanged gaps shorter than this are reprinted instead of skipped with a
/// cursor move.
const MERGE_GAP: usize = 4;

/// Owns the output stream while the game runs on the alternate screen.
pub struct TerminalRenderer<W: Write = io::Stdout> {
    out: W,
    view: GameView,
    /// What the terminal currently shows; `None` forces a full redraw.
    screen: Option<FrameBuffer>,
    next: FrameBuffer,
    drawn: Option<(GameSnapshot, Viewport)>,
    buf: Vec<u8>,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(GameView::default())
    }
}

impl TerminalRenderer {
    pub fn new(view: GameView) -> Self {
        Self::with_writer(io::stdout(), view)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn with_writer(out: W, view: GameView) -> Self {
        Self {
            out,
            view,
            screen: None,
            next: FrameBuffer::new(0, 0),
            drawn: None,
            buf: Vec::with_capacity(16 * 1024),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Switch to raw mode on the alternate screen.
    ///
    /// Focus reporting is turned on so the runner can pause when the terminal
    /// loses focus.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(terminal::SetTitle("tray-tetris"))?;
        self.buf.queue(EnableFocusChange)?;
        self.buf.queue(cursor::Hide)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        self.flush_buf()?;
        self.invalidate();
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.queue(DisableFocusChange)?;
        self.buf.queue(ResetColor)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(terminal::EnableLineWrap)?;
        self.buf.queue(cursor::Show)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.flush_buf()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Forget what is on screen; the next draw repaints everything.
    pub fn invalidate(&mut self) {
        self.screen = None;
        self.drawn = None;
    }

    /// Bring the terminal up to date with `snap`.
    ///
    /// Returns `false` when the snapshot and viewport match the last frame and
    /// nothing was laid out or written.
    pub fn draw(&mut self, snap: &GameSnapshot, viewport: Viewport) -> Result<bool> {
        if self.drawn == Some((*snap, viewport)) {
            return Ok(false);
        }

        self.view.render_into(snap, viewport, &mut self.next);

        self.buf.clear();
        let repaint = !matches!(&self.screen, Some(screen) if same_size(screen, &self.next));
        if repaint {
            encode_frame(&self.next, &mut self.buf)?;
            let blank = FrameBuffer::new(0, 0);
            self.screen = Some(std::mem::replace(&mut self.next, blank));
        } else if let Some(screen) = self.screen.as_mut() {
            encode_changes(screen, &self.next, &mut self.buf)?;
            std::mem::swap(screen, &mut self.next);
        }
        self.flush_buf()?;

        self.drawn = Some((*snap, viewport));
        Ok(true)
    }

    fn flush_buf(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.out.write_all(&self.buf)?;
        self.out.flush()?;
        Ok(())
    }
}

fn same_size(a: &FrameBuffer, b: &FrameBuffer) -> bool {
    a.width() == b.width() && a.height() == b.height()
}

/// Clear the screen and print every row of `fb`.
fn encode_frame(fb: &FrameBuffer, out: &mut Vec<u8>) -> Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let mut pen = Pen::default();
    for (y, row) in rows(fb) {
        out.queue(cursor::MoveTo(0, y))?;
        for &cell in row {
            pen.print(out, cell)?;
        }
    }
    pen.finish(out)
}

/// Rewrite the spans of `next` that differ from `screen`. Writes nothing when
/// the two are equal.
fn encode_changes(screen: &FrameBuffer, next: &FrameBuffer, out: &mut Vec<u8>) -> Result<()> {
    let mut pen = Pen::default();
    for ((y, old), (_, new)) in rows(screen).zip(rows(next)) {
        for span in Spans::new(old, new) {
            out.queue(cursor::MoveTo(span.start as u16, y))?;
            for &cell in &new[span] {
                pen.print(out, cell)?;
            }
        }
    }
    pen.finish(out)
}

fn rows(fb: &FrameBuffer) -> impl Iterator<Item = (u16, &[Cell])> {
    let width = usize::from(fb.width()).max(1);
    (0u16..).zip(fb.cells().chunks(width))
}

/// Ranges of changed cells in one row, with short unchanged gaps folded in.
struct Spans<'a> {
    old: &'a [Cell],
    new: &'a [Cell],
    x: usize,
}

impl<'a> Spans<'a> {
    fn new(old: &'a [Cell], new: &'a [Cell]) -> Self {
        Self { old, new, x: 0 }
    }

    fn changed(&self, i: usize) -> bool {
        self.old.get(i) != self.new.get(i)
    }
}

impl Iterator for Spans<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        let len = self.new.len();
        let start = (self.x..len).find(|&i| self.changed(i))?;

        let mut end = start + 1;
        let mut gap = 0;
        let mut i = end;
        while i < len && gap < MERGE_GAP {
            if self.changed(i) {
                end = i + 1;
                gap = 0;
            } else {
                gap += 1;
            }
            i += 1;
        }

        self.x = end;
        Some(start..end)
    }
}

/// Remembers the style last sent so only attributes that differ are emitted.
#[derive(Default)]
struct Pen {
    style: Option<CellStyle>,
}

impl Pen {
    fn print(&mut self, out: &mut Vec<u8>, cell: Cell) -> Result<()> {
        self.set_style(out, cell.style)?;
        out.queue(Print(cell.ch))?;
        Ok(())
    }

    fn set_style(&mut self, out: &mut Vec<u8>, style: CellStyle) -> Result<()> {
        let prev = self.style.replace(style);
        if prev == Some(style) {
            return Ok(());
        }

        if prev.map_or(true, |p| p.bold != style.bold || p.dim != style.dim) {
            // Clears bold and dim but keeps colours.
            out.queue(SetAttribute(Attribute::NormalIntensity))?;
            if style.bold {
                out.queue(SetAttribute(Attribute::Bold))?;
            }
            if style.dim {
                out.queue(SetAttribute(Attribute::Dim))?;
            }
        }
        if prev.map_or(true, |p| p.fg != style.fg) {
            out.queue(SetForegroundColor(color(style.fg)))?;
        }
        if prev.map_or(true, |p| p.bg != style.bg) {
            out.queue(SetBackgroundColor(color(style.bg)))?;
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.style.take().is_some() {
            out.queue(ResetColor)?;
            out.queue(SetAttribute(Attribute::Reset))?;
        }
        Ok(())
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}
