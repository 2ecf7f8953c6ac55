//! Input decoding: keypresses, mouse frames, frame classification.

pub mod frame;
pub mod keyboard;
pub mod mouse;
pub mod parser;
pub mod tracking;

pub use frame::{is_mouse_frame, FrameClass, FrameFilter};
pub use keyboard::{KeyState, KeyboardEvent, Modifiers};
pub use mouse::{
    ButtonState, Dialect, FrameScan, FrameScanner, MouseButton, MouseData, MouseDecoder,
    MouseEvent, MouseEventKind, MouseReport,
};
pub use parser::{InputParser, ParsedEvent};
