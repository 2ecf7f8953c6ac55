//! Input stream demultiplexer.
//!
//! Splits raw stdin bytes into keypresses and mouse frames:
//! - Mouse frames (`ESC [ <`, `ESC [ M`) go through the [`FrameScanner`]
//! - CSI sequences (arrows, Home/End, Insert/Delete, PageUp/Down, F1-F12)
//!   with the xterm modifier parameter
//! - SS3 sequences (F1-F4, application-mode arrows)
//! - Alt+key (ESC + char)
//! - Control keys (bytes 0-31, DEL)
//! - UTF-8 text
//!
//! Incomplete sequences stay buffered until more bytes arrive or the caller
//! gives up waiting and calls [`InputParser::flush_pending`].

use tracing::warn;

use super::keyboard::{KeyboardEvent, Modifiers};
use super::mouse::{FrameScan, FrameScanner, MouseReport};

// =============================================================================
// Types
// =============================================================================

/// One item recovered from the input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    Key(KeyboardEvent),
    Mouse(MouseReport),
    /// A mouse frame that could not be decoded; `consumed` bytes dropped.
    MouseError { consumed: usize },
}

enum ParseResult {
    Event(ParsedEvent),
    Incomplete,
    /// Bytes were consumed without producing an event.
    Skipped,
    None,
}

// =============================================================================
// Parser
// =============================================================================

/// Buffered input parser.
#[derive(Debug)]
pub struct InputParser {
    buf: Vec<u8>,
    scanner: FrameScanner,
}

impl InputParser {
    pub fn new() -> Self {
        Self::with_scanner(FrameScanner::default())
    }

    pub fn with_scanner(scanner: FrameScanner) -> Self {
        Self {
            buf: Vec::with_capacity(64),
            scanner,
        }
    }

    /// Append `data` and return every event that is now complete.
    pub fn parse(&mut self, data: &[u8]) -> Vec<ParsedEvent> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();

        while !self.buf.is_empty() {
            match self.try_parse_one() {
                ParseResult::Event(ev) => events.push(ev),
                ParseResult::Incomplete => break,
                ParseResult::Skipped => {}
                ParseResult::None => self.consume(1),
            }
        }

        events
    }

    /// Bytes are waiting for the rest of a sequence.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Give up on whatever is buffered (input timeout).
    ///
    /// A lone ESC becomes the Escape key; a partial mouse frame is dropped
    /// as a mouse error rather than leaking its bytes as keys.
    pub fn flush_pending(&mut self) -> Vec<ParsedEvent> {
        let mut events = Vec::new();
        while !self.buf.is_empty() {
            match self.try_parse_one() {
                ParseResult::Event(ev) => events.push(ev),
                ParseResult::Skipped => {}
                ParseResult::None => self.consume(1),
                ParseResult::Incomplete => {
                    if self.at_mouse_prefix() {
                        let consumed = self.buf.len();
                        warn!(consumed, "incomplete mouse frame dropped");
                        self.buf.clear();
                        events.push(ParsedEvent::MouseError { consumed });
                    } else if self.buf[0] == 0x1B {
                        if let ParseResult::Event(ev) = self.key(1, "Escape", Modifiers::none()) {
                            events.push(ev);
                        }
                    } else {
                        // Truncated UTF-8
                        self.consume(1);
                    }
                }
            }
        }
        events
    }

    fn at_mouse_prefix(&self) -> bool {
        matches!(self.buf.as_slice(), [0x1B, b'[', b'<' | b'M', ..])
    }

    fn try_parse_one(&mut self) -> ParseResult {
        let Some(&first) = self.buf.first() else {
            return ParseResult::None;
        };

        match first {
            0x1B => self.parse_escape(),
            0x00 => self.key(1, " ", Modifiers::ctrl()),
            0x08 | 0x7F => self.key(1, "Backspace", Modifiers::none()),
            0x09 => self.key(1, "Tab", Modifiers::none()),
            0x0A | 0x0D => self.key(1, "Enter", Modifiers::none()),
            0x01..=0x1A => {
                let ch = (first + b'a' - 1) as char;
                self.key(1, &ch.to_string(), Modifiers::ctrl())
            }
            0x20..=0x7E => {
                let ch = first as char;
                self.key(1, &ch.to_string(), Modifiers::none())
            }
            0x80..=0xFF => self.parse_utf8(),
            // FS, GS, RS, US
            _ => ParseResult::None,
        }
    }

    fn parse_escape(&mut self) -> ParseResult {
        if self.buf.len() < 2 {
            return ParseResult::Incomplete;
        }

        match self.buf[1] {
            b'[' => self.parse_csi(),
            b'O' => self.parse_ss3(),
            // The second ESC may open a mouse frame
            0x1B => self.key(1, "Escape", Modifiers::none()),
            0x20..=0x7E => {
                let ch = self.buf[1] as char;
                self.key(2, &ch.to_string(), Modifiers::alt())
            }
            _ => self.key(1, "Escape", Modifiers::none()),
        }
    }

    fn parse_csi(&mut self) -> ParseResult {
        if self.buf.len() < 3 {
            return ParseResult::Incomplete;
        }

        if matches!(self.buf[2], b'<' | b'M') {
            return self.parse_mouse();
        }

        // Focus in/out reports carry no key
        if matches!(self.buf[2], b'I' | b'O') {
            self.consume(3);
            return ParseResult::Skipped;
        }

        let Some(end) = self.buf[2..]
            .iter()
            .position(|b| (0x40..=0x7E).contains(b))
            .map(|i| i + 2)
        else {
            return ParseResult::Incomplete;
        };

        let final_byte = self.buf[end];
        let params: Vec<u32> = String::from_utf8_lossy(&self.buf[2..end])
            .split(';')
            .map(|s| s.parse::<u32>().unwrap_or(0))
            .collect();
        let consumed = end + 1;

        let modifiers = match params.get(1) {
            Some(&p) if p > 0 => Modifiers::from_csi_param(p),
            _ => Modifiers::none(),
        };

        let name = match final_byte {
            b'A' => "ArrowUp",
            b'B' => "ArrowDown",
            b'C' => "ArrowRight",
            b'D' => "ArrowLeft",
            b'H' => "Home",
            b'F' => "End",
            b'P' => "F1",
            b'Q' => "F2",
            b'R' => "F3",
            b'S' => "F4",
            b'Z' => return self.key(consumed, "Tab", Modifiers::shift()),
            b'~' => match params.first().copied().unwrap_or(0) {
                1 | 7 => "Home",
                2 => "Insert",
                3 => "Delete",
                4 | 8 => "End",
                5 => "PageUp",
                6 => "PageDown",
                15 => "F5",
                17 => "F6",
                18 => "F7",
                19 => "F8",
                20 => "F9",
                21 => "F10",
                23 => "F11",
                24 => "F12",
                _ => "",
            },
            _ => "",
        };

        if name.is_empty() {
            self.consume(consumed);
            return ParseResult::Skipped;
        }
        self.key(consumed, name, modifiers)
    }

    fn parse_ss3(&mut self) -> ParseResult {
        if self.buf.len() < 3 {
            return ParseResult::Incomplete;
        }

        let name = match self.buf[2] {
            b'A' => "ArrowUp",
            b'B' => "ArrowDown",
            b'C' => "ArrowRight",
            b'D' => "ArrowLeft",
            b'H' => "Home",
            b'F' => "End",
            b'P' => "F1",
            b'Q' => "F2",
            b'R' => "F3",
            b'S' => "F4",
            _ => {
                self.consume(3);
                return ParseResult::Skipped;
            }
        };
        self.key(3, name, Modifiers::none())
    }

    fn parse_mouse(&mut self) -> ParseResult {
        match self.scanner.scan(&self.buf) {
            FrameScan::Incomplete => ParseResult::Incomplete,
            FrameScan::Report { report, consumed } => {
                self.consume(consumed);
                ParseResult::Event(ParsedEvent::Mouse(report))
            }
            FrameScan::Malformed { consumed } => {
                let consumed = consumed.max(1);
                warn!(consumed, "malformed mouse frame");
                self.consume(consumed);
                ParseResult::Event(ParsedEvent::MouseError { consumed })
            }
        }
    }

    fn parse_utf8(&mut self) -> ParseResult {
        let first = self.buf[0];
        let expected_len = if first & 0xE0 == 0xC0 {
            2
        } else if first & 0xF0 == 0xE0 {
            3
        } else if first & 0xF8 == 0xF0 {
            4
        } else {
            return ParseResult::None;
        };

        if self.buf.len() < expected_len {
            return ParseResult::Incomplete;
        }

        match std::str::from_utf8(&self.buf[..expected_len]) {
            Ok(s) => {
                let name = s.to_string();
                self.key(expected_len, &name, Modifiers::none())
            }
            Err(_) => ParseResult::None,
        }
    }

    /// Emit a key built from the first `n` bytes and consume them.
    fn key(&mut self, n: usize, name: &str, modifiers: Modifiers) -> ParseResult {
        let raw = String::from_utf8_lossy(&self.buf[..n]).into_owned();
        self.consume(n);
        ParseResult::Event(ParsedEvent::Key(
            KeyboardEvent::with_modifiers(name, modifiers).with_raw(raw),
        ))
    }

    fn consume(&mut self, n: usize) {
        self.buf.drain(..n.min(self.buf.len()));
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
