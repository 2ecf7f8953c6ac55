//! Screen buffer and style compositor.
//!
//! The [`Screen`] owns one [`ScreenRow`] per terminal row. Each frame:
//!
//! 1. `update()` rebuilds a blank buffer at the current terminal size
//! 2. collaborators `write()` styled runs row by row at the cursor
//! 3. `flush()` emits every row with absolute positioning, then clears
//!    whatever is below the last row
//!
//! Every write merges the run styles into the row's interval tiling, so a
//! later write over part of an earlier one keeps the earlier styling on the
//! cells it did not touch.

use std::io::Write;

use tracing::{trace, warn};

use super::ansi;
use super::interval::{self, StyleInterval};
use super::output::{OutputBuffer, StyleTracker};
use crate::error::{Error, Result};
use crate::pipeline::terminal::TerminalSize;
use crate::types::{Style, StyledRun};

// =============================================================================
// ScreenRow
// =============================================================================

/// One fixed-width row of text with its style tiling.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRow {
    cells: Vec<char>,
    intervals: Vec<StyleInterval>,
}

impl ScreenRow {
    /// A row of spaces with one default-style interval.
    pub fn blank(width: usize) -> Self {
        let intervals = if width == 0 {
            Vec::new()
        } else {
            vec![StyleInterval::new(0, width, Style::default())]
        };
        Self {
            cells: vec![' '; width],
            intervals,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// The row text.
    pub fn text(&self) -> String {
        self.cells.iter().collect()
    }

    pub fn intervals(&self) -> &[StyleInterval] {
        &self.intervals
    }

    /// Text covered by `interval`.
    pub fn slice(&self, interval: &StyleInterval) -> String {
        self.cells[interval.start..interval.end].iter().collect()
    }

    /// Place `text` (already clipped to fit) with its relative tiling at
    /// column `x`.
    ///
    /// The text is always spliced. If the merge fails the previous
    /// intervals stay in place and the error is returned.
    fn place(&mut self, x: usize, text: &[char], incoming: &[StyleInterval]) -> Result<()> {
        let end = x + text.len();
        self.cells[x..end].copy_from_slice(text);
        let merged = interval::merge(&self.intervals, incoming, x, self.width())?;
        self.intervals = merged;
        Ok(())
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Write position in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

// =============================================================================
// Screen
// =============================================================================

/// The character/style grid shared by everything drawn in a frame.
#[derive(Debug)]
pub struct Screen {
    size: TerminalSize,
    width: usize,
    rows: Vec<ScreenRow>,
    cursor: Cursor,
    output: OutputBuffer,
    tracker: StyleTracker,
    anomalies: Vec<Error>,
}

impl Screen {
    /// Create a screen reading its dimensions from `size`.
    ///
    /// The buffer is empty until the first `update()`.
    pub fn new(size: TerminalSize) -> Self {
        Self {
            size,
            width: 0,
            rows: Vec::new(),
            cursor: Cursor::default(),
            output: OutputBuffer::new(),
            tracker: StyleTracker::new(),
            anomalies: Vec::new(),
        }
    }

    /// Start a frame: home the cursor, re-read the terminal size and
    /// replace the buffer with blank rows.
    pub fn update(&mut self) {
        let (width, height) = self.size.read();
        self.width = width as usize;
        self.cursor = Cursor::default();
        self.rows = (0..height).map(|_| ScreenRow::blank(self.width)).collect();
        trace!(width, height, "screen updated");
    }

    /// Move the write cursor.
    pub fn cursor_to(&mut self, x: usize, y: usize) {
        self.cursor = Cursor { x, y };
    }

    /// Paint `runs` on the cursor row starting at the cursor column, then
    /// move the cursor to the start of the next row.
    ///
    /// Text past the row width is dropped; rows outside the buffer are
    /// ignored.
    pub fn write<I, R>(&mut self, runs: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<StyledRun>,
    {
        let Cursor { x, y } = self.cursor;
        self.cursor = Cursor { x: 0, y: y + 1 };

        let Some(row) = self.rows.get_mut(y) else {
            return;
        };
        let room = row.width().saturating_sub(x);
        if room == 0 {
            return;
        }

        let mut text: Vec<char> = Vec::new();
        let mut incoming: Vec<StyleInterval> = Vec::new();
        for run in runs {
            let run = run.into();
            let start = text.len();
            text.extend(run.text.chars().take(room - start));
            if text.len() > start {
                incoming.push(StyleInterval::new(start, text.len(), run.style));
            }
            if text.len() == room {
                break;
            }
        }
        if text.is_empty() {
            return;
        }

        if let Err(err) = row.place(x, &text, &incoming) {
            let err = match err {
                Error::Tiling { reason, .. } => Error::Tiling { row: y, reason },
                other => other,
            };
            warn!(row = y, error = %err, "style merge failed, keeping previous styling");
            self.anomalies.push(err);
        }
    }

    /// Emit the whole buffer to `out`.
    pub fn flush<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.output.clear();
        for (y, row) in self.rows.iter().enumerate() {
            ansi::cursor_to(&mut self.output, 0, y as u16)?;
            self.tracker.reset();
            for interval in row.intervals() {
                self.tracker.apply(&mut self.output, &interval.style);
                self.output.push_cells(&row.cells[interval.start..interval.end]);
            }
            ansi::reset(&mut self.output)?;
        }
        ansi::erase_down(&mut self.output)?;
        self.output.flush_to(out)?;
        Ok(())
    }

    /// Compose the frame without writing it anywhere.
    pub fn render_to_string(&mut self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        self.flush(&mut buf).ok();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Drain the compositor anomalies recorded since the last call.
    pub fn take_anomalies(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.anomalies)
    }

    pub fn row(&self, y: usize) -> Option<&ScreenRow> {
        self.rows.get(y)
    }

    pub fn rows(&self) -> &[ScreenRow] {
        &self.rows
    }

    /// `(width, height)` of the current buffer.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.rows.len())
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The size source this screen reads on `update()`.
    pub fn terminal_size(&self) -> &TerminalSize {
        &self.size
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::interval::check_tiling;
    use crate::types::Color;

    fn screen(width: u16, height: u16) -> Screen {
        let mut screen = Screen::new(TerminalSize::fixed(width, height));
        screen.update();
        screen
    }

    fn red() -> Style {
        Style::new().fg(Color::RED)
    }

    fn blue() -> Style {
        Style::new().fg(Color::BLUE)
    }

    #[test]
    fn test_update_builds_blank_rows() {
        let screen = screen(10, 3);
        assert_eq!(screen.size(), (10, 3));
        for row in screen.rows() {
            assert_eq!(row.text(), " ".repeat(10));
            assert_eq!(row.intervals(), &[StyleInterval::new(0, 10, Style::default())]);
        }
    }

    #[test]
    fn test_overwrite_keeps_untouched_styling() {
        let mut screen = screen(80, 24);
        screen.write([StyledRun::new("Hi", red())]);
        screen.cursor_to(0, 0);
        screen.write([StyledRun::new("X", blue())]);

        let row = screen.row(0).unwrap();
        assert_eq!(row.text(), format!("Xi{}", " ".repeat(78)));
        assert_eq!(
            row.intervals(),
            &[
                StyleInterval::new(0, 1, blue()),
                StyleInterval::new(1, 2, red()),
                StyleInterval::new(2, 80, Style::default()),
            ]
        );
    }

    #[test]
    fn test_write_advances_cursor() {
        let mut screen = screen(10, 3);
        screen.cursor_to(4, 1);
        screen.write(["ab"]);
        assert_eq!(screen.cursor(), Cursor { x: 0, y: 2 });
        assert_eq!(screen.row(1).unwrap().text(), "    ab    ");
        screen.write(["cd"]);
        assert_eq!(screen.row(2).unwrap().text(), "cd        ");
    }

    #[test]
    fn test_multiple_runs_in_one_write() {
        let mut screen = screen(10, 1);
        screen.cursor_to(1, 0);
        screen.write([
            StyledRun::new("ab", red()),
            StyledRun::plain(""),
            StyledRun::new("cd", blue()),
        ]);
        let row = screen.row(0).unwrap();
        assert_eq!(row.text(), " abcd     ");
        assert_eq!(
            row.intervals(),
            &[
                StyleInterval::new(0, 1, Style::default()),
                StyleInterval::new(1, 3, red()),
                StyleInterval::new(3, 5, blue()),
                StyleInterval::new(5, 10, Style::default()),
            ]
        );
    }

    #[test]
    fn test_overflow_truncated() {
        let mut screen = screen(5, 1);
        screen.cursor_to(3, 0);
        screen.write([StyledRun::new("abcdef", red())]);
        let row = screen.row(0).unwrap();
        assert_eq!(row.text(), "   ab");
        assert!(check_tiling(row.intervals(), 5).is_ok());
        assert_eq!(*row.intervals().last().unwrap(), StyleInterval::new(3, 5, red()));
    }

    #[test]
    fn test_out_of_range_write_is_noop() {
        let mut screen = screen(5, 2);
        screen.cursor_to(0, 7);
        screen.write(["zzz"]);
        screen.cursor_to(9, 0);
        screen.write(["zzz"]);
        assert!(screen.rows().iter().all(|r| r.text() == "     "));
        assert!(screen.take_anomalies().is_empty());
    }

    #[test]
    fn test_resize_on_update() {
        let size = TerminalSize::fixed(10, 2);
        let mut screen = Screen::new(size.clone());
        screen.update();
        screen.write(["hello"]);
        size.set(4, 3);
        screen.update();
        assert_eq!(screen.size(), (4, 3));
        assert_eq!(screen.row(0).unwrap().text(), "    ");
        assert_eq!(screen.cursor(), Cursor::default());
    }

    #[test]
    fn test_flush_output() {
        let mut screen = screen(4, 2);
        screen.write([StyledRun::new("ab", red())]);
        let out = screen.render_to_string();
        assert_eq!(
            out,
            "\x1b[1;1H\x1b[0m\x1b[31mab\x1b[0m  \x1b[0m\
             \x1b[2;1H\x1b[0m    \x1b[0m\
             \x1b[J"
        );
    }

    #[test]
    fn test_flush_is_deterministic() {
        let style = Style::new().fg(Color::RED).bg(Color::BLACK).bold().overline();
        let mut a = screen(6, 1);
        a.write([StyledRun::new("xy", style)]);
        let mut b = screen(6, 1);
        b.write([StyledRun::new("xy", style)]);
        assert_eq!(a.render_to_string(), b.render_to_string());
        assert_eq!(a.render_to_string(), a.render_to_string());
    }
}
