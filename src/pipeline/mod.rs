//! Pipeline
//!
//! Connects terminal input and output to the element registry:
//!
//! ```text
//! stdin bytes → Session::feed → handlers → Router
//! Session::render → Screen::update → Router::draw → Screen::flush → stdout
//! ```

pub mod session;
pub mod terminal;

// Re-exports
pub use session::{ErrorHandler, HandlerId, KeyHandler, MouseHandler, Session};
pub use terminal::TerminalSize;
