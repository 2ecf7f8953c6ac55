//! Terminal renderer - the screen compositor.
//!
//! Knows only about rows of cells and their style tiling. Collaborators
//! paint styled runs through [`Screen::write`]; the screen merges them into
//! each row's [`StyleInterval`] list and flushes the whole frame as ANSI
//! escape sequences.

pub mod ansi;
pub mod interval;
pub mod output;
pub mod screen;

// Re-exports for convenience
pub use interval::{check_tiling, merge, StyleInterval};
pub use output::{OutputBuffer, StyleTracker};
pub use screen::{Cursor, Screen, ScreenRow};
