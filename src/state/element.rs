//! Interactive elements.
//!
//! An element is anything that occupies a rectangle on screen and wants
//! mouse/keyboard events routed to it. The [`Router`](super::Router) owns
//! the live rectangle and visibility; the element itself only reacts to
//! [`ElementEvent`]s and paints itself when asked.

use bitflags::bitflags;

use crate::input::{KeyboardEvent, MouseEvent};
use crate::renderer::Screen;
use crate::types::Rect;

/// Z-layer of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Layer 0.
    Control,
    /// Layer 1. A modal popup captures all input while shown.
    Popup { modal: bool },
}

impl ElementKind {
    pub fn is_popup(self) -> bool {
        matches!(self, Self::Popup { .. })
    }

    pub fn is_modal(self) -> bool {
        matches!(self, Self::Popup { modal: true })
    }
}

bitflags! {
    /// What an element allows the router to do with it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const NONE      = 0;
        const FOCUSABLE = 1 << 0;
        const DRAGGABLE = 1 << 1;
    }
}

/// Registration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub id: String,
    pub kind: ElementKind,
    pub rect: Rect,
    pub capabilities: Capabilities,
    pub visible: bool,
}

impl ElementSpec {
    pub fn new(id: impl Into<String>, kind: ElementKind, rect: Rect) -> Self {
        Self {
            id: id.into(),
            kind,
            rect,
            capabilities: Capabilities::NONE,
            visible: true,
        }
    }

    pub fn control(id: impl Into<String>, rect: Rect) -> Self {
        Self::new(id, ElementKind::Control, rect)
    }

    pub fn popup(id: impl Into<String>, rect: Rect) -> Self {
        Self::new(id, ElementKind::Popup { modal: false }, rect)
    }

    pub fn modal(id: impl Into<String>, rect: Rect) -> Self {
        Self::new(id, ElementKind::Popup { modal: true }, rect)
    }

    pub fn focusable(mut self) -> Self {
        self.capabilities |= Capabilities::FOCUSABLE;
        self
    }

    pub fn draggable(mut self) -> Self {
        self.capabilities |= Capabilities::DRAGGABLE;
        self
    }

    /// Register without showing.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// What the router tells an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEvent {
    /// A mouse event that hit the element. `local` has coordinates relative
    /// to the element's origin.
    Mouse { raw: MouseEvent, local: MouseEvent },
    Key(KeyboardEvent),
    /// Focus gained (`true`) or lost.
    Focus(bool),
    /// The element was dragged to a new rectangle.
    Moved(Rect),
}

/// An on-screen element.
pub trait Element {
    fn handle(&mut self, event: &ElementEvent);

    /// Paint into `rect` on the current frame.
    fn draw(&mut self, _rect: Rect, _focused: bool, _screen: &mut Screen) {}
}

/// An [`Element`] that only listens.
pub struct Listener<F> {
    f: F,
}

/// Wrap a closure as an element that draws nothing.
pub fn listener<F: FnMut(&ElementEvent)>(f: F) -> Listener<F> {
    Listener { f }
}

impl<F: FnMut(&ElementEvent)> Element for Listener<F> {
    fn handle(&mut self, event: &ElementEvent) {
        (self.f)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_spec_builders() {
        let spec = ElementSpec::modal("dialog", Rect::new(1, 1, 10, 4))
            .focusable()
            .draggable()
            .hidden();
        assert!(spec.kind.is_modal());
        assert!(spec.capabilities.contains(Capabilities::FOCUSABLE | Capabilities::DRAGGABLE));
        assert!(!spec.visible);
        assert!(!ElementSpec::control("c", Rect::default()).kind.is_popup());
    }

    #[test]
    fn test_listener_forwards() {
        let mut seen = Vec::new();
        {
            let mut element = listener(|e: &ElementEvent| seen.push(e.clone()));
            element.handle(&ElementEvent::Focus(true));
        }
        assert_eq!(seen, vec![ElementEvent::Focus(true)]);
    }
}
