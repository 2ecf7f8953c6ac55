//! Frame output buffering and stateful style emission.
//!
//! A frame is composed into one [`OutputBuffer`] and handed to the terminal
//! with a single `write_all`. The [`StyleTracker`] keeps style escapes out
//! of the stream while consecutive intervals share a style.

use std::io::{self, Write};

use super::ansi;
use crate::types::Style;

// =============================================================================
// OutputBuffer
// =============================================================================

/// Bytes of one frame, built up before anything reaches the terminal.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Sized for a full 80x24 frame with styling.
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(16 * 1024),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop the pending frame, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append row cells as UTF-8.
    pub fn push_cells(&mut self, cells: &[char]) {
        let mut utf8 = [0u8; 4];
        for c in cells {
            self.data.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
        }
    }

    /// Write the frame to `writer` and start a new one.
    pub fn flush_to<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        writer.write_all(&self.data)?;
        writer.flush()?;
        self.data.clear();
        Ok(())
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// StyleTracker
// =============================================================================

/// Emits style escapes only when the style differs from the last one.
///
/// Reset at the start of every row so each row is self-contained.
#[derive(Debug, Default)]
pub struct StyleTracker {
    last: Option<Style>,
}

impl StyleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the tracked style.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Apply `style` if it is not already active.
    pub fn apply(&mut self, output: &mut OutputBuffer, style: &Style) {
        if self.last.as_ref() == Some(style) {
            return;
        }
        // Writes into the buffer never fail
        ansi::style(output, style).ok();
        self.last = Some(*style);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_push_cells_utf8() {
        let mut buf = OutputBuffer::new();
        buf.push_cells(&['a', 'é', '─']);
        let mut sink = Vec::new();
        buf.flush_to(&mut sink).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "aé─");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_flush_writes_nothing() {
        let mut buf = OutputBuffer::new();
        let mut sink = Vec::new();
        buf.flush_to(&mut sink).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tracker_skips_repeated_style() {
        let mut tracker = StyleTracker::new();
        let mut output = OutputBuffer::new();
        let style = Style::new().fg(Color::RED);

        tracker.apply(&mut output, &style);
        let first = output.len();
        tracker.apply(&mut output, &style);
        assert_eq!(output.len(), first);

        tracker.reset();
        tracker.apply(&mut output, &style);
        assert_eq!(output.len(), first * 2);
    }
}
