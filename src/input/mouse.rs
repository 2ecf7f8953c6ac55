//! Mouse protocol decoding.
//!
//! Two report dialects arrive on the input stream:
//!
//! - **X11**: `ESC [ M` followed by three raw bytes (status, x, y), each
//!   biased by 32. Coordinates top out at 223.
//! - **SGR**: `ESC [ <` followed by decimal `button;x;y` and `M` (press or
//!   motion) or `m` (release). Coordinates are 1-based and unbiased.
//!
//! [`FrameScanner`] finds frame boundaries with an explicit state machine so
//! the number of bytes a frame used is always known, malformed or not.
//! [`MouseDecoder`] turns a [`MouseReport`] into a named [`MouseEvent`],
//! keeping per-button press origins to classify drags.
//!
//! # Button code layout
//!
//! | bits   | meaning                          |
//! |--------|----------------------------------|
//! | 0-1    | button identity (0 L, 1 M, 2 R, 3 other/release) |
//! | 2      | shift                            |
//! | 3      | alt                              |
//! | 4      | ctrl                             |
//! | 5      | motion                           |
//! | 6 (+0) | wheel up (64) / down (65)        |

use std::io::Write;

use tracing::debug;

use super::tracking::TrackingGuard;
use crate::config::X11Overflow;
use crate::renderer::ansi;
use crate::types::Rect;

/// Prefix for every mouse event name.
pub const BASE: &str = "MOUSE";

/// Largest coordinate a single X11 byte can carry.
pub const X11_MAX_COORD: u16 = 255 - 32;

// =============================================================================
// TYPES
// =============================================================================

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other,
}

impl MouseButton {
    /// Button identity from the low two bits of a button code.
    pub fn from_code(code: u16) -> Self {
        match code & 3 {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            _ => Self::Other,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Middle => "MIDDLE",
            Self::Right => "RIGHT",
            Self::Other => "OTHER",
        }
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Motion,
    Drag,
    Pressed(MouseButton),
    Released(MouseButton),
    WheelUp,
    WheelDown,
    /// A frame that could not be decoded; `consumed` bytes were skipped.
    Error { consumed: usize },
}

/// Position and modifiers of a mouse event.
///
/// `x`/`y` are the terminal's 1-based report coordinates. `x_from`/`y_from`
/// are the press origin of the dragging button, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseData {
    pub x: u16,
    pub y: u16,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub left: bool,
    pub right: bool,
    pub x_from: Option<u16>,
    pub y_from: Option<u16>,
}

/// Mouse event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub data: MouseData,
}

impl MouseEvent {
    pub fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            data: MouseData {
                x,
                y,
                ..MouseData::default()
            },
        }
    }

    /// The `ERROR` sentinel.
    pub fn error(consumed: usize) -> Self {
        Self::new(MouseEventKind::Error { consumed }, 0, 0)
    }

    /// Canonical event name, e.g. `MOUSE_LEFT_BUTTON_PRESSED`.
    pub fn name(&self) -> String {
        match self.kind {
            MouseEventKind::Motion => format!("{BASE}_MOTION"),
            MouseEventKind::Drag => format!("{BASE}_DRAG"),
            MouseEventKind::Pressed(b) => format!("{BASE}_{}_BUTTON_PRESSED", b.label()),
            MouseEventKind::Released(b) => format!("{BASE}_{}_BUTTON_RELEASED", b.label()),
            MouseEventKind::WheelUp => format!("{BASE}_WHEEL_UP"),
            MouseEventKind::WheelDown => format!("{BASE}_WHEEL_DOWN"),
            MouseEventKind::Error { .. } => "ERROR".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, MouseEventKind::Error { .. })
    }

    /// The 0-based screen cell this event points at.
    pub fn cell(&self) -> (u16, u16) {
        (self.data.x.saturating_sub(1), self.data.y.saturating_sub(1))
    }

    /// A copy with coordinates (and drag origin) relative to `rect`'s origin.
    pub fn relative_to(&self, rect: Rect) -> Self {
        let mut local = *self;
        local.data.x = self.data.x.saturating_sub(rect.x);
        local.data.y = self.data.y.saturating_sub(rect.y);
        local.data.x_from = self.data.x_from.map(|x| x.saturating_sub(rect.x));
        local.data.y_from = self.data.y_from.map(|y| y.saturating_sub(rect.y));
        local
    }
}

// =============================================================================
// FRAME SCANNER
// =============================================================================

/// Mouse report dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    X11,
    Sgr,
}

/// A mouse report with its fields split out but not yet interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseReport {
    pub dialect: Dialect,
    /// Button code with the X11 bias removed.
    pub code: u16,
    pub x: u16,
    pub y: u16,
    /// SGR `m` terminator.
    pub release: bool,
}

/// Result of scanning the start of a buffer for a mouse frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameScan {
    /// More bytes are needed.
    Incomplete,
    /// A complete frame of `consumed` bytes.
    Report { report: MouseReport, consumed: usize },
    /// Not decodable; skip `consumed` bytes (0 when nothing can be said).
    Malformed { consumed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    SawEsc,
    SawBracket,
    ReadingFields,
    Done,
}

/// Finds mouse frames at the start of a byte buffer.
#[derive(Debug, Clone, Copy)]
pub struct FrameScanner {
    pub max_sgr_len: usize,
    pub x11_overflow: X11Overflow,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self {
            max_sgr_len: 32,
            x11_overflow: X11Overflow::Clamp,
        }
    }
}

impl FrameScanner {
    /// Scan `buf`, which must start at a frame boundary.
    pub fn scan(&self, buf: &[u8]) -> FrameScan {
        let mut state = ScanState::Idle;
        let mut fields_start = 0;
        let mut i = 0;

        while i < buf.len() {
            let byte = buf[i];
            state = match (state, byte) {
                (ScanState::Idle, 0x1B) => ScanState::SawEsc,
                (ScanState::SawEsc, b'[') => ScanState::SawBracket,
                (ScanState::SawBracket, b'<') => {
                    fields_start = i + 1;
                    ScanState::ReadingFields
                }
                (ScanState::SawBracket, b'M') => return self.scan_x11(&buf[i + 1..], i + 1),
                (ScanState::ReadingFields, b'0'..=b'9' | b';') => {
                    if i - fields_start >= self.max_sgr_len {
                        return FrameScan::Malformed { consumed: i };
                    }
                    ScanState::ReadingFields
                }
                (ScanState::ReadingFields, b'M' | b'm') => ScanState::Done,
                // Stop before the offending byte so it is parsed again as input
                (ScanState::ReadingFields, _) => return FrameScan::Malformed { consumed: i },
                _ => return FrameScan::Malformed { consumed: 0 },
            };
            i += 1;
            if state == ScanState::Done {
                break;
            }
        }

        if state != ScanState::Done {
            return FrameScan::Incomplete;
        }

        let consumed = i;
        let release = buf[i - 1] == b'm';
        match parse_sgr_fields(&buf[fields_start..i - 1]) {
            Some((code, x, y)) => FrameScan::Report {
                report: MouseReport {
                    dialect: Dialect::Sgr,
                    code,
                    x,
                    y,
                    release,
                },
                consumed,
            },
            None => FrameScan::Malformed { consumed },
        }
    }

    fn scan_x11(&self, body: &[u8], prefix_len: usize) -> FrameScan {
        if body.len() < 3 {
            return FrameScan::Incomplete;
        }
        let consumed = prefix_len + 3;
        if body[0] < 32 {
            return FrameScan::Malformed { consumed };
        }
        let code = (body[0] - 32) as u16;
        let (Some(x), Some(y)) = (self.x11_coord(body[1]), self.x11_coord(body[2])) else {
            return FrameScan::Malformed { consumed };
        };
        FrameScan::Report {
            report: MouseReport {
                dialect: Dialect::X11,
                code,
                x,
                y,
                release: false,
            },
            consumed,
        }
    }

    /// A byte below 33 cannot be a valid 1-based coordinate; xterm sends it
    /// for positions past the encodable range.
    fn x11_coord(&self, byte: u8) -> Option<u16> {
        if byte > 32 {
            return Some((byte - 32) as u16);
        }
        match self.x11_overflow {
            X11Overflow::Clamp => Some(X11_MAX_COORD),
            X11Overflow::Reject => None,
        }
    }
}

fn parse_sgr_fields(fields: &[u8]) -> Option<(u16, u16, u16)> {
    let text = std::str::from_utf8(fields).ok()?;
    let mut parts = text.split(';');
    let code = parts.next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((code, x, y))
}

// =============================================================================
// BUTTON STATE
// =============================================================================

/// Press origin of each button still held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    pub left: Option<(u16, u16)>,
    pub middle: Option<(u16, u16)>,
    pub right: Option<(u16, u16)>,
    pub other: Option<(u16, u16)>,
    last_pressed: Option<MouseButton>,
}

impl ButtonState {
    pub fn get(&self, button: MouseButton) -> Option<(u16, u16)> {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Middle => self.middle,
            MouseButton::Right => self.right,
            MouseButton::Other => self.other,
        }
    }

    fn slot(&mut self, button: MouseButton) -> &mut Option<(u16, u16)> {
        match button {
            MouseButton::Left => &mut self.left,
            MouseButton::Middle => &mut self.middle,
            MouseButton::Right => &mut self.right,
            MouseButton::Other => &mut self.other,
        }
    }

    fn press(&mut self, button: MouseButton, at: (u16, u16)) {
        *self.slot(button) = Some(at);
        self.last_pressed = Some(button);
    }

    fn release(&mut self, button: MouseButton) {
        *self.slot(button) = None;
        if self.last_pressed == Some(button) {
            self.last_pressed = None;
        }
    }

    /// The most recently pressed button that is still held.
    pub fn last_pressed(&self) -> Option<MouseButton> {
        self.last_pressed.filter(|b| self.get(*b).is_some())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// DECODER
// =============================================================================

/// Turns mouse reports into events and owns mouse tracking for a session.
#[derive(Debug, Default)]
pub struct MouseDecoder {
    buttons: ButtonState,
    guard: Option<TrackingGuard>,
}

impl MouseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one report.
    pub fn decode(&mut self, report: &MouseReport) -> MouseEvent {
        let code = report.code;
        let mut data = MouseData {
            x: report.x,
            y: report.y,
            shift: code & 4 != 0,
            alt: code & 8 != 0,
            ctrl: code & 16 != 0,
            ..MouseData::default()
        };

        // Wheel events are stateless
        if code & 64 != 0 {
            let kind = if code & 1 == 0 {
                MouseEventKind::WheelUp
            } else {
                MouseEventKind::WheelDown
            };
            return MouseEvent { kind, data };
        }

        let x11_release = report.dialect == Dialect::X11 && code & 3 == 3;
        let button = if x11_release {
            self.buttons.last_pressed().unwrap_or(MouseButton::Other)
        } else {
            MouseButton::from_code(code)
        };
        data.left = button == MouseButton::Left;
        data.right = button == MouseButton::Right;

        let kind = if code & 32 != 0 {
            if data.left || data.right {
                if let Some((x, y)) = self.buttons.get(button) {
                    data.x_from = Some(x);
                    data.y_from = Some(y);
                }
                MouseEventKind::Drag
            } else {
                data.left = false;
                data.right = false;
                MouseEventKind::Motion
            }
        } else if report.release || x11_release {
            if x11_release {
                // X11 does not say which button went up; nothing stays held
                self.buttons.clear();
            } else {
                self.buttons.release(button);
            }
            MouseEventKind::Released(button)
        } else {
            self.buttons.press(button, (report.x, report.y));
            MouseEventKind::Pressed(button)
        };

        MouseEvent { kind, data }
    }

    pub fn buttons(&self) -> &ButtonState {
        &self.buttons
    }

    pub fn is_enabled(&self) -> bool {
        self.guard.is_some()
    }

    /// Turn on SGR any-motion reporting and arm the exit guard.
    pub fn enable<W: Write>(&mut self, out: &mut W, restore_on_panic: bool) -> std::io::Result<()> {
        if self.guard.is_some() {
            return Ok(());
        }
        ansi::enable_mouse(out)?;
        out.flush()?;
        self.guard = Some(TrackingGuard::arm(restore_on_panic));
        debug!("mouse tracking enabled");
        Ok(())
    }

    /// Turn reporting off and forget held buttons. Safe to call repeatedly,
    /// including when tracking was never enabled.
    pub fn disable<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let Some(guard) = self.guard.take() else {
            return Ok(());
        };
        self.buttons.clear();
        guard.disarm();
        ansi::disable_mouse(out)?;
        out.flush()?;
        debug!("mouse tracking disabled");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
