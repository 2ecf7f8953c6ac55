//! Keyboard event types.
//!
//! Key names follow one convention across the toolkit: printable keys are
//! the character itself (`"a"`, `"Z"`, `"é"`), everything else is a word
//! (`"Enter"`, `"Escape"`, `"ArrowUp"`, `"F5"`).

// =============================================================================
// TYPES
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Create empty modifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Create modifiers with ctrl
    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    /// Create modifiers with alt
    pub fn alt() -> Self {
        Self { alt: true, ..Self::default() }
    }

    /// Create modifiers with shift
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }

    /// Decode the xterm CSI modifier parameter (1-based bitmask).
    pub fn from_csi_param(param: u32) -> Self {
        let val = param.saturating_sub(1);
        Self {
            shift: val & 1 != 0,
            alt: val & 2 != 0,
            ctrl: val & 4 != 0,
            meta: val & 8 != 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Key event state.
///
/// Legacy xterm input only reports presses, so the parser always produces
/// `Press`. `Repeat` and `Release` are kept for terminals that report key
/// events with the progressive keyboard protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyState {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// The key that was pressed (e.g., "a", "Enter", "ArrowUp")
    pub key: String,
    /// Modifier keys state
    pub modifiers: Modifiers,
    /// Press/repeat/release state
    pub state: KeyState,
    /// Raw byte sequence the key was decoded from
    pub raw: String,
}

impl KeyboardEvent {
    /// Create a simple key press event
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_modifiers(key, Modifiers::default())
    }

    /// Create a key press with modifiers
    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            state: KeyState::Press,
            raw: String::new(),
        }
    }

    /// Attach the raw sequence.
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Check if this is a press event
    pub fn is_press(&self) -> bool {
        self.state == KeyState::Press
    }

    /// `key` matches and ctrl is held.
    pub fn is_ctrl(&self, key: &str) -> bool {
        self.modifiers.ctrl && self.key == key
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_decode() {
        assert_eq!(Modifiers::from_csi_param(2), Modifiers::shift());
        assert_eq!(Modifiers::from_csi_param(3), Modifiers::alt());
        assert_eq!(Modifiers::from_csi_param(5), Modifiers::ctrl());
        assert!(Modifiers::from_csi_param(9).meta);
        assert!(Modifiers::from_csi_param(0).is_empty());
    }

    #[test]
    fn test_event_builders() {
        let event = KeyboardEvent::with_modifiers("c", Modifiers::ctrl()).with_raw("\x03");
        assert!(event.is_ctrl("c"));
        assert!(event.is_press());
        assert_eq!(event.raw, "\x03");
    }
}
