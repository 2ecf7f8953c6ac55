//! ANSI escape sequences for terminal control.
//!
//! Everything the compositor and the mouse decoder send to the terminal:
//! - Absolute cursor positioning
//! - Screen clearing
//! - Colors (ANSI 16, 256, and TrueColor)
//! - Text attributes in one fixed order
//! - Mouse reporting control

use crate::types::{Attr, Color, Style};
use std::io::Write;

// =============================================================================
// Constants
// =============================================================================

/// Enable SGR extended mouse coordinates.
pub const SGR_MOUSE_ON: &str = "\x1b[?1006h";

/// Enable any-motion mouse tracking.
pub const ANY_MOTION_ON: &str = "\x1b[?1003h";

/// Disable SGR extended mouse coordinates.
pub const SGR_MOUSE_OFF: &str = "\x1b[?1006l";

/// Disable any-motion mouse tracking.
pub const ANY_MOTION_OFF: &str = "\x1b[?1003l";

// =============================================================================
// Cursor / Screen
// =============================================================================

/// Move cursor to absolute position (0-indexed in, 1-indexed on the wire).
#[inline]
pub fn cursor_to<W: Write>(w: &mut W, x: u16, y: u16) -> std::io::Result<()> {
    write!(w, "\x1b[{};{}H", y as u32 + 1, x as u32 + 1)
}

/// Clear from cursor to end of screen.
#[inline]
pub fn erase_down<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[J")
}

// =============================================================================
// Colors
// =============================================================================

/// Reset all attributes and colors.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[0m")
}

/// Set foreground color.
pub fn fg<W: Write>(w: &mut W, color: Color) -> std::io::Result<()> {
    match color {
        Color::Named(named) => {
            let index = named.index();
            if index < 8 {
                write!(w, "\x1b[{}m", 30 + index)
            } else {
                write!(w, "\x1b[{}m", 90 + index - 8)
            }
        }
        Color::Indexed(index) => write!(w, "\x1b[38;5;{}m", index),
        Color::Rgb(r, g, b) => write!(w, "\x1b[38;2;{};{};{}m", r, g, b),
    }
}

/// Set background color.
pub fn bg<W: Write>(w: &mut W, color: Color) -> std::io::Result<()> {
    match color {
        Color::Named(named) => {
            let index = named.index();
            if index < 8 {
                write!(w, "\x1b[{}m", 40 + index)
            } else {
                write!(w, "\x1b[{}m", 100 + index - 8)
            }
        }
        Color::Indexed(index) => write!(w, "\x1b[48;5;{}m", index),
        Color::Rgb(r, g, b) => write!(w, "\x1b[48;2;{};{};{}m", r, g, b),
    }
}

// =============================================================================
// Text Attributes
// =============================================================================

/// Set text attributes from bitflags.
///
/// Flags are always emitted in the same order so equal sets produce
/// equal bytes.
#[allow(unused_assignments)]
pub fn attrs<W: Write>(w: &mut W, attr: Attr) -> std::io::Result<()> {
    if attr.is_empty() {
        return Ok(());
    }

    let mut first = true;
    write!(w, "\x1b[")?;

    macro_rules! emit {
        ($flag:expr, $code:expr) => {
            if attr.contains($flag) {
                if !first {
                    write!(w, ";")?;
                }
                write!(w, "{}", $code)?;
                first = false;
            }
        };
    }

    emit!(Attr::BOLD, 1);
    emit!(Attr::DIM, 2);
    emit!(Attr::ITALIC, 3);
    emit!(Attr::UNDERLINE, 4);
    emit!(Attr::INVERSE, 7);
    emit!(Attr::HIDDEN, 8);
    emit!(Attr::STRIKETHROUGH, 9);
    emit!(Attr::OVERLINE, 53);

    write!(w, "m")
}

/// Reset, then apply a complete style: foreground, background, toggles.
pub fn style<W: Write>(w: &mut W, style: &Style) -> std::io::Result<()> {
    reset(w)?;
    if let Some(color) = style.fg {
        fg(w, color)?;
    }
    if let Some(color) = style.bg {
        bg(w, color)?;
    }
    attrs(w, style.attrs)
}

// =============================================================================
// Mouse Support
// =============================================================================

/// Enable mouse tracking: SGR extended coordinates, then any-motion events.
#[inline]
pub fn enable_mouse<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "{}{}", SGR_MOUSE_ON, ANY_MOTION_ON)
}

/// Disable mouse tracking, in the same order it was enabled.
#[inline]
pub fn disable_mouse<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "{}{}", SGR_MOUSE_OFF, ANY_MOTION_OFF)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NamedColor;

    fn to_string<F: FnOnce(&mut Vec<u8>) -> std::io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_cursor_to() {
        assert_eq!(to_string(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(to_string(|w| cursor_to(w, 5, 10)), "\x1b[11;6H");
    }

    #[test]
    fn test_erase_down() {
        assert_eq!(to_string(|w| erase_down(w)), "\x1b[J");
    }

    #[test]
    fn test_colors() {
        assert_eq!(to_string(|w| fg(w, Color::RED)), "\x1b[31m");
        assert_eq!(
            to_string(|w| fg(w, Color::Named(NamedColor::BrightRed))),
            "\x1b[91m"
        );
        assert_eq!(to_string(|w| bg(w, Color::BLUE)), "\x1b[44m");
        assert_eq!(to_string(|w| fg(w, Color::Indexed(208))), "\x1b[38;5;208m");
        assert_eq!(
            to_string(|w| bg(w, Color::Rgb(1, 2, 3))),
            "\x1b[48;2;1;2;3m"
        );
    }

    #[test]
    fn test_attrs_fixed_order() {
        let a = to_string(|w| attrs(w, Attr::OVERLINE | Attr::BOLD | Attr::ITALIC));
        let b = to_string(|w| attrs(w, Attr::ITALIC | Attr::OVERLINE | Attr::BOLD));
        assert_eq!(a, "\x1b[1;3;53m");
        assert_eq!(a, b);
        assert_eq!(to_string(|w| attrs(w, Attr::NONE)), "");
    }

    #[test]
    fn test_style() {
        let s = Style::new().fg(Color::RED).underline();
        assert_eq!(to_string(|w| style(w, &s)), "\x1b[0m\x1b[31m\x1b[4m");
        assert_eq!(to_string(|w| style(w, &Style::new())), "\x1b[0m");
    }

    #[test]
    fn test_mouse_sequences() {
        assert_eq!(to_string(|w| enable_mouse(w)), "\x1b[?1006h\x1b[?1003h");
        assert_eq!(to_string(|w| disable_mouse(w)), "\x1b[?1006l\x1b[?1003l");
    }
}
