//! Terminal size source.
//!
//! The screen re-reads the terminal size on every `update()`. The size is
//! held in a reactive signal so collaborators can track resizes; in detect
//! mode each read refreshes it from crossterm first.

use spark_signals::{signal, Signal};

/// Where the screen gets its dimensions from.
#[derive(Clone)]
pub struct TerminalSize {
    size: Signal<(u16, u16)>,
    detect: bool,
}

impl TerminalSize {
    /// Query the real terminal on every read, falling back to the last
    /// known size (initially `fallback`) when the query fails.
    pub fn detect(fallback: (u16, u16)) -> Self {
        Self {
            size: signal(fallback),
            detect: true,
        }
    }

    /// A fixed size that only changes through [`TerminalSize::set`].
    pub fn fixed(width: u16, height: u16) -> Self {
        Self {
            size: signal((width, height)),
            detect: false,
        }
    }

    /// Record a new size (called on resize events).
    pub fn set(&self, width: u16, height: u16) {
        self.size.set((width, height));
    }

    /// Current `(width, height)`.
    pub fn read(&self) -> (u16, u16) {
        if self.detect {
            if let Ok(size) = crossterm::terminal::size() {
                if size != self.size.get() {
                    self.size.set(size);
                }
            }
        }
        self.size.get()
    }

    /// The size signal for reactive tracking.
    pub fn signal(&self) -> Signal<(u16, u16)> {
        self.size.clone()
    }
}

impl std::fmt::Debug for TerminalSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSize")
            .field("size", &self.size.get())
            .field("detect", &self.detect)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size() {
        let size = TerminalSize::fixed(120, 40);
        assert_eq!(size.read(), (120, 40));
        size.set(80, 24);
        assert_eq!(size.read(), (80, 24));
    }

    #[test]
    fn test_clones_share_size() {
        let size = TerminalSize::fixed(10, 5);
        let other = size.clone();
        other.set(20, 6);
        assert_eq!(size.read(), (20, 6));
        assert_eq!(size.signal().get(), (20, 6));
    }
}
