//! # termtile
//!
//! Core of a character-cell terminal UI toolkit.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! observable state (terminal size, focused element).
//!
//! ## Architecture
//!
//! ```text
//! stdin → InputParser → MouseDecoder / KeyboardEvent → Router → Element
//! Element::draw → Screen::write → style interval merge → Screen::flush → stdout
//! ```
//!
//! - The **screen compositor** keeps one row of text per terminal row plus a
//!   sorted, non-overlapping list of style intervals that tiles the row.
//!   Overlapping writes are merged so untouched cells keep their styling.
//! - The **mouse decoder** reads SGR (`ESC[<b;x;yM`) and X11 (`ESC[M` + 3
//!   bytes) reports and names them (`MOUSE_LEFT_BUTTON_PRESSED`,
//!   `MOUSE_DRAG`, ...), tracking press origins for drags.
//! - The **router** hit-tests decoded events against registered elements
//!   (popups above controls), keeps a single focus, traps focus in modal
//!   popups and moves draggable elements.
//!
//! ## Modules
//!
//! - [`types`] - Colors, attributes, styles, styled runs, rectangles
//! - [`renderer`] - Style intervals, screen buffer, ANSI output
//! - [`input`] - Input parser, mouse decoder, frame classifier
//! - [`state`] - Elements, focus, dispatch
//! - [`pipeline`] - Session and terminal size
//! - [`config`] - Session configuration

pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod renderer;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{Config, X11Overflow};
pub use error::{Error, Result};

pub use renderer::{check_tiling, merge, Cursor, Screen, ScreenRow, StyleInterval};

pub use input::{
    is_mouse_frame, FrameClass, FrameFilter, InputParser, KeyState, KeyboardEvent, Modifiers,
    MouseButton, MouseData, MouseDecoder, MouseEvent, MouseEventKind, ParsedEvent,
};

pub use state::{listener, Capabilities, Element, ElementEvent, ElementKind, ElementSpec, Router};

pub use pipeline::{HandlerId, Session, TerminalSize};
