//! Core types for termtile.
//!
//! These are the values that flow from collaborators into the compositor:
//! colors, attribute flags, styles, styled runs and rectangles.

use serde::{Deserialize, Serialize};

// =============================================================================
// Color
// =============================================================================

/// The 16 standard ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl NamedColor {
    const ALL: [(NamedColor, &'static str); 16] = [
        (NamedColor::Black, "black"),
        (NamedColor::Red, "red"),
        (NamedColor::Green, "green"),
        (NamedColor::Yellow, "yellow"),
        (NamedColor::Blue, "blue"),
        (NamedColor::Magenta, "magenta"),
        (NamedColor::Cyan, "cyan"),
        (NamedColor::White, "white"),
        (NamedColor::BrightBlack, "blackBright"),
        (NamedColor::BrightRed, "redBright"),
        (NamedColor::BrightGreen, "greenBright"),
        (NamedColor::BrightYellow, "yellowBright"),
        (NamedColor::BrightBlue, "blueBright"),
        (NamedColor::BrightMagenta, "magentaBright"),
        (NamedColor::BrightCyan, "cyanBright"),
        (NamedColor::BrightWhite, "whiteBright"),
    ];

    /// Palette index (0-15).
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Canonical name, as accepted by [`Color::parse`].
    pub fn name(self) -> &'static str {
        Self::ALL[self as usize].1
    }

    fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "gray" | "grey" => return Some(NamedColor::BrightBlack),
            _ => {}
        }
        // Accept both "redBright" and "brightRed"
        let base = lower
            .strip_prefix("bright")
            .map(|rest| format!("{rest}bright"))
            .unwrap_or(lower);
        Self::ALL
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(&base))
            .map(|(c, _)| *c)
    }
}

/// A terminal color.
///
/// Colors are parsed from strings: a name (`"red"`, `"redBright"`,
/// `"brightRed"`, `"gray"`), hex (`"#f00"`, `"#ff0000"`), `"rgb(r,g,b)"`,
/// or a palette index (`"ansi(208)"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    Named(NamedColor),
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Self = Self::Named(NamedColor::Black);
    pub const RED: Self = Self::Named(NamedColor::Red);
    pub const GREEN: Self = Self::Named(NamedColor::Green);
    pub const YELLOW: Self = Self::Named(NamedColor::Yellow);
    pub const BLUE: Self = Self::Named(NamedColor::Blue);
    pub const MAGENTA: Self = Self::Named(NamedColor::Magenta);
    pub const CYAN: Self = Self::Named(NamedColor::Cyan);
    pub const WHITE: Self = Self::Named(NamedColor::White);
    pub const GRAY: Self = Self::Named(NamedColor::BrightBlack);

    /// Parse a color string. Unknown values yield `None`, which the
    /// compositor renders as "no color".
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(body) = strip_call(value, "rgb") {
            let parts: Vec<&str> = body.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return None;
            }
            let r = parts[0].parse().ok()?;
            let g = parts[1].parse().ok()?;
            let b = parts[2].parse().ok()?;
            return Some(Self::Rgb(r, g, b));
        }
        if let Some(body) = strip_call(value, "ansi") {
            return body.trim().parse().ok().map(Self::Indexed);
        }
        NamedColor::from_name(value).map(Self::Named)
    }
}

fn strip_call<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let rest = value.strip_prefix(name)?;
    rest.strip_prefix('(')?.strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    match digits.as_slice() {
        [r, g, b] => Some(Color::Rgb(r * 17, g * 17, b * 17)),
        [r1, r2, g1, g2, b1, b2] => Some(Color::Rgb(
            r1 * 16 + r2,
            g1 * 16 + g2,
            b1 * 16 + b2,
        )),
        _ => None,
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("unknown color: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        match color {
            Color::Named(named) => named.name().to_string(),
            Color::Indexed(index) => format!("ansi({index})"),
            Color::Rgb(r, g, b) => format!("#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

// =============================================================================
// Attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Independent text toggles.
    ///
    /// Combine with bitwise OR: `Attr::BOLD | Attr::ITALIC`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const INVERSE = 1 << 4;
        const HIDDEN = 1 << 5;
        const STRIKETHROUGH = 1 << 6;
        const OVERLINE = 1 << 7;
    }
}

// =============================================================================
// Style
// =============================================================================

/// Style attributes for a run of text.
///
/// A plain value: builder methods return a modified copy. In JSON the
/// toggles are booleans next to `color` and `background`; color strings
/// that do not parse leave the color unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "StyleFields", into = "StyleFields")]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: Attr,
}

/// Wire form of [`Style`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StyleFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    dim: bool,
    #[serde(skip_serializing_if = "is_false")]
    italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    underline: bool,
    #[serde(skip_serializing_if = "is_false")]
    inverse: bool,
    #[serde(skip_serializing_if = "is_false")]
    hidden: bool,
    #[serde(skip_serializing_if = "is_false")]
    strikethrough: bool,
    #[serde(skip_serializing_if = "is_false")]
    overline: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl StyleFields {
    fn toggles(&self) -> [(bool, Attr); 8] {
        [
            (self.bold, Attr::BOLD),
            (self.dim, Attr::DIM),
            (self.italic, Attr::ITALIC),
            (self.underline, Attr::UNDERLINE),
            (self.inverse, Attr::INVERSE),
            (self.hidden, Attr::HIDDEN),
            (self.strikethrough, Attr::STRIKETHROUGH),
            (self.overline, Attr::OVERLINE),
        ]
    }
}

impl From<StyleFields> for Style {
    fn from(fields: StyleFields) -> Self {
        let attrs = fields
            .toggles()
            .into_iter()
            .filter(|(on, _)| *on)
            .fold(Attr::NONE, |acc, (_, attr)| acc | attr);
        Self {
            fg: fields.color.as_deref().and_then(Color::parse),
            bg: fields.background.as_deref().and_then(Color::parse),
            attrs,
        }
    }
}

impl From<Style> for StyleFields {
    fn from(style: Style) -> Self {
        let has = |attr| style.attrs.contains(attr);
        Self {
            color: style.fg.map(String::from),
            background: style.bg.map(String::from),
            bold: has(Attr::BOLD),
            dim: has(Attr::DIM),
            italic: has(Attr::ITALIC),
            underline: has(Attr::UNDERLINE),
            inverse: has(Attr::INVERSE),
            hidden: has(Attr::HIDDEN),
            strikethrough: has(Attr::STRIKETHROUGH),
            overline: has(Attr::OVERLINE),
        }
    }
}

impl Style {
    /// The default style: terminal colors, no toggles.
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            attrs: Attr::NONE,
        }
    }

    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Set the foreground from a color string; unknown strings leave it unset.
    pub fn fg_str(mut self, color: &str) -> Self {
        self.fg = Color::parse(color);
        self
    }

    /// Set the background from a color string; unknown strings leave it unset.
    pub fn bg_str(mut self, color: &str) -> Self {
        self.bg = Color::parse(color);
        self
    }

    pub fn with(mut self, attrs: Attr) -> Self {
        self.attrs |= attrs;
        self
    }

    pub fn bold(self) -> Self {
        self.with(Attr::BOLD)
    }

    pub fn dim(self) -> Self {
        self.with(Attr::DIM)
    }

    pub fn italic(self) -> Self {
        self.with(Attr::ITALIC)
    }

    pub fn underline(self) -> Self {
        self.with(Attr::UNDERLINE)
    }

    pub fn inverse(self) -> Self {
        self.with(Attr::INVERSE)
    }

    pub fn hidden(self) -> Self {
        self.with(Attr::HIDDEN)
    }

    pub fn strikethrough(self) -> Self {
        self.with(Attr::STRIKETHROUGH)
    }

    pub fn overline(self) -> Self {
        self.with(Attr::OVERLINE)
    }

    /// True when nothing would be emitted for this style.
    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }
}

// =============================================================================
// StyledRun
// =============================================================================

/// A piece of text painted with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: Style,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::default())
    }

    /// Width in cells (one cell per char).
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

impl From<&str> for StyledRun {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for StyledRun {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

// =============================================================================
// Rect
// =============================================================================

/// A rectangle in 0-based screen cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Check if a cell is inside this rect.
    #[inline]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && (x as u32) < self.x as u32 + self.width as u32
            && (y as u32) < self.y as u32 + self.height as u32
    }

    /// The top `rows` rows of this rect.
    pub fn top_rows(&self, rows: u16) -> Rect {
        Rect::new(self.x, self.y, self.width, rows.min(self.height))
    }

    /// Same size, new origin.
    pub fn moved_to(&self, x: u16, y: u16) -> Rect {
        Rect::new(x, y, self.width, self.height)
    }
}

// =============================================================================
// Tests
// =============================================================================
