//! Focus state.
//!
//! One element at most is focused. The focused id lives in a signal so
//! collaborators can react to focus moves without polling. Modal popups
//! push a snapshot of the focus they displaced; hiding the modal hands that
//! snapshot back so the router can restore it exactly.

use spark_signals::{signal, Signal};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    owner: String,
    focused: Option<String>,
}

/// Current focus plus the modal snapshot stack.
pub struct FocusState {
    focused: Signal<Option<String>>,
    snapshots: Vec<Snapshot>,
}

impl FocusState {
    pub fn new() -> Self {
        Self {
            focused: signal(None),
            snapshots: Vec::new(),
        }
    }

    /// The focused element id.
    pub fn current(&self) -> Option<String> {
        self.focused.get()
    }

    pub fn is_focused(&self, id: &str) -> bool {
        self.focused.get().as_deref() == Some(id)
    }

    /// Move focus. Returns the previous id when it changed.
    pub fn set(&mut self, id: Option<String>) -> Option<Option<String>> {
        let old = self.focused.get();
        if old == id {
            return None;
        }
        self.focused.set(id);
        Some(old)
    }

    /// The signal carrying the focused id.
    pub fn signal(&self) -> Signal<Option<String>> {
        self.focused.clone()
    }

    /// Save the current focus on behalf of modal `owner`.
    pub fn push_snapshot(&mut self, owner: &str) {
        self.snapshots.push(Snapshot {
            owner: owner.to_string(),
            focused: self.current(),
        });
    }

    /// Remove `owner`'s snapshot and return the focus it saved.
    ///
    /// Snapshots pushed later that saved `owner` itself inherit what
    /// `owner` saved, so modals closed out of order still restore the
    /// focus from before the first of them.
    pub fn take_snapshot(&mut self, owner: &str) -> Option<Option<String>> {
        let pos = self.snapshots.iter().rposition(|s| s.owner == owner)?;
        let removed = self.snapshots.remove(pos);
        for later in &mut self.snapshots[pos..] {
            if later.focused.as_deref() == Some(owner) {
                later.focused = removed.focused.clone();
            }
        }
        Some(removed.focused)
    }

    /// The innermost modal holding a snapshot.
    pub fn modal(&self) -> Option<&str> {
        self.snapshots.last().map(|s| s.owner.as_str())
    }

    pub fn has_modal(&self, owner: &str) -> bool {
        self.snapshots.iter().any(|s| s.owner == owner)
    }

    /// Forget `id` wherever a snapshot refers to it.
    pub fn forget(&mut self, id: &str) {
        for snapshot in &mut self.snapshots {
            if snapshot.focused.as_deref() == Some(id) {
                snapshot.focused = None;
            }
        }
    }
}

impl Default for FocusState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FocusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusState")
            .field("focused", &self.current())
            .field("snapshots", &self.snapshots)
            .finish()
    }
}
