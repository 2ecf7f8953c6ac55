//! Event dispatch and hit-testing.
//!
//! The [`Router`] keeps a registry of elements on two z-layers: controls
//! (layer 0) and popups (layer 1). A decoded mouse event is routed to at
//! most one element:
//!
//! 1. visible popups, most recently registered first
//! 2. visible controls, most recently registered first, only when no
//!    popup contains the point
//!
//! While a modal popup is shown, only that popup receives mouse events and
//! focus cannot leave it.
//!
//! Focus follows left presses on focusable elements; a press anywhere
//! outside the focused element blurs it. A left press in the grab region
//! of a focused draggable element starts a drag that follows the pointer
//! until the left button is released.

use spark_signals::Signal;
use tracing::{debug, trace};

use super::element::{Capabilities, Element, ElementEvent, ElementKind, ElementSpec};
use super::focus::FocusState;
use crate::error::{Error, Result};
use crate::input::{KeyboardEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::renderer::Screen;
use crate::types::Rect;

struct Entry {
    id: String,
    kind: ElementKind,
    capabilities: Capabilities,
    rect: Rect,
    visible: bool,
    element: Box<dyn Element>,
}

impl Entry {
    fn focusable(&self) -> bool {
        self.visible && self.capabilities.contains(Capabilities::FOCUSABLE)
    }
}

/// An active drag: the pointer position at the press and the origin the
/// element had then.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Drag {
    id: String,
    grab: (u16, u16),
    origin: (u16, u16),
}

/// Routes decoded events to registered elements.
pub struct Router {
    entries: Vec<Entry>,
    focus: FocusState,
    drag: Option<Drag>,
    popup_header_rows: u16,
}

impl Router {
    pub fn new(popup_header_rows: u16) -> Self {
        Self {
            entries: Vec::new(),
            focus: FocusState::new(),
            drag: None,
            popup_header_rows,
        }
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Add an element. Ids are unique; a duplicate leaves the registry as
    /// it was.
    pub fn register(&mut self, spec: ElementSpec, element: Box<dyn Element>) -> Result<()> {
        if self.index_of(&spec.id).is_some() {
            return Err(Error::DuplicateElement(spec.id));
        }
        debug!(id = %spec.id, kind = ?spec.kind, rect = ?spec.rect, "element registered");

        let show_modal = spec.visible && spec.kind.is_modal();
        let id = spec.id.clone();
        self.entries.push(Entry {
            id: spec.id,
            kind: spec.kind,
            capabilities: spec.capabilities,
            rect: spec.rect,
            // Modals become visible through `show` so the focus snapshot is taken
            visible: spec.visible && !show_modal,
            element,
        });
        if show_modal {
            self.show(&id)?;
        }
        Ok(())
    }

    /// Remove an element, dropping its focus, drag and modal frame.
    pub fn unregister(&mut self, id: &str) -> Result<Box<dyn Element>> {
        let index = self.require(id)?;
        if self.entries[index].visible {
            self.hide(id)?;
        }
        if self.focus.is_focused(id) {
            self.focus.set(None);
        }
        self.focus.forget(id);
        debug!(id, "element unregistered");
        Ok(self.entries.remove(index).element)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live rectangle of `id`.
    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.index_of(id).map(|i| self.entries[i].rect)
    }

    pub fn set_rect(&mut self, id: &str, rect: Rect) -> Result<()> {
        let index = self.require(id)?;
        self.entries[index].rect = rect;
        Ok(())
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.index_of(id).is_some_and(|i| self.entries[i].visible)
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Make `id` visible. Showing a modal popup saves the current focus and
    /// moves focus into the popup.
    pub fn show(&mut self, id: &str) -> Result<()> {
        let index = self.require(id)?;
        if self.entries[index].visible {
            return Ok(());
        }
        self.entries[index].visible = true;
        if self.entries[index].kind.is_modal() && !self.focus.has_modal(id) {
            self.end_drag();
            self.focus.push_snapshot(id);
            debug!(id, saved = ?self.focus.current(), "modal shown");
            self.set_focus(Some(id.to_string()));
        }
        Ok(())
    }

    /// Hide `id`. Hiding a modal restores the focus it displaced when that
    /// element is still registered and visible.
    pub fn hide(&mut self, id: &str) -> Result<()> {
        let index = self.require(id)?;
        if !self.entries[index].visible {
            return Ok(());
        }
        self.entries[index].visible = false;
        if self.drag.as_ref().is_some_and(|d| d.id == id) {
            self.end_drag();
        }

        if let Some(saved) = self.focus.take_snapshot(id) {
            let restore = match self.focus.modal() {
                // Another modal is still up; focus stays inside it
                Some(outer) => Some(outer.to_string()),
                None => saved.filter(|s| self.is_visible(s)),
            };
            debug!(id, restored = ?restore, "modal hidden");
            self.set_focus(restore);
        } else if self.focus.is_focused(id) {
            self.set_focus(None);
        }
        Ok(())
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Focus `id`. Returns `false` when it cannot take focus: hidden, not
    /// focusable, or outside the shown modal.
    pub fn focus(&mut self, id: &str) -> Result<bool> {
        let index = self.require(id)?;
        if !self.entries[index].focusable() && !self.focus.has_modal(id) {
            return Ok(false);
        }
        if self.focus.modal().is_some_and(|m| m != id) {
            return Ok(false);
        }
        self.set_focus(Some(id.to_string()));
        Ok(true)
    }

    pub fn blur(&mut self) {
        self.set_focus(None);
    }

    pub fn focused(&self) -> Option<String> {
        self.focus.current()
    }

    /// Signal carrying the focused id.
    pub fn focus_signal(&self) -> Signal<Option<String>> {
        self.focus.signal()
    }

    /// The innermost shown modal.
    pub fn modal(&self) -> Option<&str> {
        self.focus.modal()
    }

    fn set_focus(&mut self, id: Option<String>) {
        let new = id.clone();
        let Some(old) = self.focus.set(id) else {
            return;
        };
        debug!(from = ?old, to = ?new, "focus changed");
        if let Some(i) = old.as_deref().and_then(|o| self.index_of(o)) {
            self.entries[i].element.handle(&ElementEvent::Focus(false));
        }
        if let Some(i) = new.as_deref().and_then(|n| self.index_of(n)) {
            self.entries[i].element.handle(&ElementEvent::Focus(true));
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// The element under the 0-based cell `(x, y)`.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<&str> {
        self.hit_index(x, y).map(|i| self.entries[i].id.as_str())
    }

    fn hit_index(&self, x: u16, y: u16) -> Option<usize> {
        if let Some(modal) = self.focus.modal() {
            return self
                .index_of(modal)
                .filter(|&i| self.entries[i].visible && self.entries[i].rect.contains(x, y));
        }
        let scan = |popups: bool| {
            self.entries.iter().rposition(|e| {
                e.visible && e.kind.is_popup() == popups && e.rect.contains(x, y)
            })
        };
        scan(true).or_else(|| scan(false))
    }

    /// Route a mouse event. Returns the id of the element that received it.
    pub fn dispatch_mouse(&mut self, event: &MouseEvent) -> Option<String> {
        if event.is_error() {
            return None;
        }

        if let Some(id) = self.track_drag(event) {
            return Some(id);
        }

        let (x, y) = event.cell();
        let target = self.hit_index(x, y);

        if let MouseEventKind::Pressed(button) = event.kind {
            self.press_focus(button, target, (x, y));
            if button == MouseButton::Left {
                if let Some(index) = target {
                    self.try_start_drag(index, event, (x, y));
                }
            }
        }

        let index = target?;
        let entry = &mut self.entries[index];
        trace!(id = %entry.id, event = %event.name(), "mouse dispatched");
        let local = event.relative_to(entry.rect);
        entry.element.handle(&ElementEvent::Mouse { raw: *event, local });
        Some(entry.id.clone())
    }

    /// Route a key to the focused element.
    pub fn dispatch_key(&mut self, event: &KeyboardEvent) -> Option<String> {
        let focused = self.focus.current()?;
        if self.focus.modal().is_some_and(|m| m != focused) {
            return None;
        }
        let index = self.index_of(&focused)?;
        trace!(id = %focused, key = %event.key, "key dispatched");
        self.entries[index].element.handle(&ElementEvent::Key(event.clone()));
        Some(focused)
    }

    fn press_focus(&mut self, button: MouseButton, target: Option<usize>, cell: (u16, u16)) {
        if button == MouseButton::Left {
            if let Some(index) = target.filter(|&i| self.entries[i].focusable()) {
                let id = self.entries[index].id.clone();
                self.set_focus(Some(id));
                return;
            }
        }
        // Focus cannot leave a shown modal
        if self.focus.modal().is_some() {
            return;
        }
        let outside = self
            .focus
            .current()
            .and_then(|id| self.index_of(&id))
            .is_some_and(|i| !self.entries[i].rect.contains(cell.0, cell.1));
        if outside {
            self.set_focus(None);
        }
    }

    // =========================================================================
    // Drag
    // =========================================================================

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Id of the element being dragged.
    pub fn dragging(&self) -> Option<&str> {
        self.drag.as_ref().map(|d| d.id.as_str())
    }

    fn grab_region(&self, entry: &Entry) -> Rect {
        match entry.kind {
            ElementKind::Popup { .. } => entry.rect.top_rows(self.popup_header_rows),
            ElementKind::Control => entry.rect,
        }
    }

    fn try_start_drag(&mut self, index: usize, event: &MouseEvent, cell: (u16, u16)) {
        let entry = &self.entries[index];
        if self.drag.is_some()
            || !entry.capabilities.contains(Capabilities::DRAGGABLE)
            || !self.focus.is_focused(&entry.id)
            || !self.grab_region(entry).contains(cell.0, cell.1)
        {
            return;
        }
        debug!(id = %entry.id, x = event.data.x, y = event.data.y, "drag started");
        self.drag = Some(Drag {
            id: entry.id.clone(),
            grab: (event.data.x, event.data.y),
            origin: (entry.rect.x, entry.rect.y),
        });
    }

    /// Move the dragged element or end the drag. Returns the id when the
    /// event was consumed by the drag.
    fn track_drag(&mut self, event: &MouseEvent) -> Option<String> {
        let drag = self.drag.clone()?;
        match event.kind {
            MouseEventKind::Drag if event.data.left => {
                let Some(index) = self.index_of(&drag.id) else {
                    self.drag = None;
                    return None;
                };
                let follow = |origin: u16, grab: u16, now: u16| {
                    (origin as i32 + now as i32 - grab as i32).clamp(0, u16::MAX as i32) as u16
                };
                let x = follow(drag.origin.0, drag.grab.0, event.data.x);
                let y = follow(drag.origin.1, drag.grab.1, event.data.y);

                let entry = &mut self.entries[index];
                let local = event.relative_to(entry.rect);
                entry.element.handle(&ElementEvent::Mouse { raw: *event, local });
                if (x, y) != (entry.rect.x, entry.rect.y) {
                    entry.rect = entry.rect.moved_to(x, y);
                    trace!(id = %entry.id, x, y, "element moved");
                    entry.element.handle(&ElementEvent::Moved(entry.rect));
                }
                Some(drag.id)
            }
            MouseEventKind::Released(MouseButton::Left) => {
                self.end_drag();
                None
            }
            _ => None,
        }
    }

    fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!(id = %drag.id, "drag ended");
        }
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Draw every visible element: controls first, then popups, each layer
    /// in registration order.
    pub fn draw(&mut self, screen: &mut Screen) {
        for popups in [false, true] {
            for entry in &mut self.entries {
                if entry.visible && entry.kind.is_popup() == popups {
                    let focused = self.focus.is_focused(&entry.id);
                    entry.element.draw(entry.rect, focused, screen);
                }
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn index_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn require(&self, id: &str) -> Result<usize> {
        self.index_of(id)
            .ok_or_else(|| Error::UnknownElement(id.to_string()))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(1)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.entries.iter().map(|e| e.id.as_str()).collect();
        f.debug_struct("Router")
            .field("elements", &ids)
            .field("focus", &self.focus)
            .field("drag", &self.drag)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::element::listener;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<ElementEvent>>>;

    fn recorder() -> (Log, Box<dyn Element>) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, Box::new(listener(move |e: &ElementEvent| sink.borrow_mut().push(e.clone()))))
    }

    fn add(router: &mut Router, spec: ElementSpec) -> Log {
        let (log, element) = recorder();
        router.register(spec, element).unwrap();
        log
    }

    fn mouse(kind: MouseEventKind, x: u16, y: u16) -> MouseEvent {
        let mut event = MouseEvent::new(kind, x, y);
        event.data.left = matches!(
            kind,
            MouseEventKind::Pressed(MouseButton::Left)
                | MouseEventKind::Released(MouseButton::Left)
                | MouseEventKind::Drag
        );
        event
    }

    fn press(x: u16, y: u16) -> MouseEvent {
        mouse(MouseEventKind::Pressed(MouseButton::Left), x, y)
    }

    fn release(x: u16, y: u16) -> MouseEvent {
        mouse(MouseEventKind::Released(MouseButton::Left), x, y)
    }

    fn drag(x: u16, y: u16) -> MouseEvent {
        mouse(MouseEventKind::Drag, x, y)
    }

    fn mouse_hits(log: &Log) -> usize {
        log.borrow()
            .iter()
            .filter(|e| matches!(e, ElementEvent::Mouse { .. }))
            .count()
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut router = Router::default();
        add(&mut router, ElementSpec::control("a", Rect::new(0, 0, 5, 5)));
        let (_, element) = recorder();
        let err = router.register(ElementSpec::popup("a", Rect::new(9, 9, 1, 1)), element);
        assert!(matches!(err, Err(Error::DuplicateElement(id)) if id == "a"));
        assert_eq!(router.len(), 1);
        assert_eq!(router.rect("a"), Some(Rect::new(0, 0, 5, 5)));
    }

    #[test]
    fn test_popup_shadows_control() {
        let mut router = Router::default();
        let control = add(&mut router, ElementSpec::control("c", Rect::new(0, 0, 20, 20)));
        let popup = add(&mut router, ElementSpec::popup("p", Rect::new(5, 5, 10, 10)));

        assert_eq!(router.dispatch_mouse(&press(11, 11)), Some("p".into()));
        assert_eq!(mouse_hits(&popup), 1);
        assert_eq!(mouse_hits(&control), 0);

        assert_eq!(router.dispatch_mouse(&press(2, 2)), Some("c".into()));
        assert_eq!(mouse_hits(&control), 1);
    }

    #[test]
    fn test_latest_registration_wins() {
        let mut router = Router::default();
        add(&mut router, ElementSpec::control("below", Rect::new(0, 0, 10, 10)));
        add(&mut router, ElementSpec::control("above", Rect::new(0, 0, 10, 10)));
        assert_eq!(router.hit_test(3, 3), Some("above"));
        router.hide("above").unwrap();
        assert_eq!(router.hit_test(3, 3), Some("below"));
    }

    #[test]
    fn test_local_coordinates() {
        let mut router = Router::default();
        let log = add(&mut router, ElementSpec::control("c", Rect::new(10, 4, 5, 5)));
        router.dispatch_mouse(&press(12, 6));
        match &log.borrow()[0] {
            ElementEvent::Mouse { raw, local } => {
                assert_eq!((raw.data.x, raw.data.y), (12, 6));
                assert_eq!((local.data.x, local.data.y), (2, 2));
            }
            other => panic!("expected mouse, got {other:?}"),
        }
    }

    #[test]
    fn test_focus_follows_left_press() {
        let mut router = Router::default();
        let a = add(&mut router, ElementSpec::control("a", Rect::new(0, 0, 5, 1)).focusable());
        add(&mut router, ElementSpec::control("b", Rect::new(0, 1, 5, 1)).focusable());
        add(&mut router, ElementSpec::control("label", Rect::new(0, 2, 5, 1)));

        router.dispatch_mouse(&press(1, 1));
        assert_eq!(router.focused(), Some("a".into()));
        router.dispatch_mouse(&press(1, 2));
        assert_eq!(router.focused(), Some("b".into()));
        assert!(a.borrow().contains(&ElementEvent::Focus(false)));

        // Motion never moves focus
        router.dispatch_mouse(&mouse(MouseEventKind::Motion, 1, 1));
        assert_eq!(router.focused(), Some("b".into()));

        // Press on a non-focusable element outside the focused one blurs
        router.dispatch_mouse(&press(1, 3));
        assert_eq!(router.focused(), None);
    }

    #[test]
    fn test_keys_go_to_focused() {
        let mut router = Router::default();
        let a = add(&mut router, ElementSpec::control("a", Rect::new(0, 0, 5, 1)).focusable());
        assert_eq!(router.dispatch_key(&KeyboardEvent::new("x")), None);
        router.focus("a").unwrap();
        assert_eq!(router.dispatch_key(&KeyboardEvent::new("x")), Some("a".into()));
        assert!(a.borrow().contains(&ElementEvent::Key(KeyboardEvent::new("x"))));
    }

    #[test]
    fn test_modal_traps_and_restores_focus() {
        let mut router = Router::default();
        add(&mut router, ElementSpec::control("field", Rect::new(0, 0, 80, 24)).focusable());
        let dialog = add(
            &mut router,
            ElementSpec::modal("dialog", Rect::new(10, 5, 20, 6)).hidden(),
        );
        router.focus("field").unwrap();
        let signal = router.focus_signal();

        router.show("dialog").unwrap();
        assert_eq!(router.focused(), Some("dialog".into()));
        assert_eq!(signal.get(), Some("dialog".into()));
        assert!(dialog.borrow().contains(&ElementEvent::Focus(true)));

        // Outside the modal nothing is hit and focus stays put
        assert_eq!(router.dispatch_mouse(&press(1, 1)), None);
        assert_eq!(router.focused(), Some("dialog".into()));
        assert!(!router.focus("field").unwrap());

        router.hide("dialog").unwrap();
        assert_eq!(router.focused(), Some("field".into()));
        assert_eq!(signal.get(), Some("field".into()));
    }

    #[test]
    fn test_stacked_modals_hidden_out_of_order() {
        let mut router = Router::default();
        add(&mut router, ElementSpec::control("field", Rect::new(0, 0, 80, 24)).focusable());
        add(&mut router, ElementSpec::modal("a", Rect::new(10, 5, 20, 6)).hidden());
        add(&mut router, ElementSpec::modal("b", Rect::new(12, 7, 10, 3)).hidden());
        router.focus("field").unwrap();

        router.show("a").unwrap();
        router.show("b").unwrap();
        assert_eq!(router.focused(), Some("b".into()));

        router.hide("a").unwrap();
        assert_eq!(router.modal(), Some("b"));
        assert_eq!(router.focused(), Some("b".into()));

        router.hide("b").unwrap();
        assert_eq!(router.modal(), None);
        assert_eq!(router.focused(), Some("field".into()));
    }

    #[test]
    fn test_unknown_element() {
        let mut router = Router::default();
        assert!(matches!(router.show("nope"), Err(Error::UnknownElement(_))));
        assert!(router.unregister("nope").is_err());
    }

    #[test]
    fn test_drag_popup_by_header() {
        let mut router = Router::default();
        let log = add(
            &mut router,
            ElementSpec::popup("p", Rect::new(10, 10, 8, 4)).focusable().draggable(),
        );

        // Body press focuses but does not start a drag
        router.dispatch_mouse(&press(12, 13));
        assert!(!router.is_dragging());
        router.dispatch_mouse(&release(12, 13));

        // Header press starts the drag
        router.dispatch_mouse(&press(12, 11));
        assert_eq!(router.dragging(), Some("p"));
        router.dispatch_mouse(&drag(15, 13));
        assert_eq!(router.rect("p"), Some(Rect::new(13, 12, 8, 4)));
        assert!(log.borrow().contains(&ElementEvent::Moved(Rect::new(13, 12, 8, 4))));

        // Clamped at zero
        router.dispatch_mouse(&drag(1, 1));
        assert_eq!(router.rect("p"), Some(Rect::new(0, 0, 8, 4)));

        router.dispatch_mouse(&release(1, 1));
        assert!(!router.is_dragging());
    }

    #[test]
    fn test_drag_requires_focus_and_capability() {
        let mut router = Router::default();
        add(&mut router, ElementSpec::control("fixed", Rect::new(0, 0, 5, 5)).focusable());
        add(&mut router, ElementSpec::control("loose", Rect::new(10, 0, 5, 5)).draggable());
        router.dispatch_mouse(&press(2, 2));
        assert!(!router.is_dragging());
        router.dispatch_mouse(&press(12, 2));
        assert!(!router.is_dragging());
    }

    #[test]
    fn test_unregister_clears_focus() {
        let mut router = Router::default();
        add(&mut router, ElementSpec::control("a", Rect::new(0, 0, 5, 5)).focusable());
        router.focus("a").unwrap();
        router.unregister("a").unwrap();
        assert_eq!(router.focused(), None);
        assert!(router.is_empty());
    }
}
