//! State Module - Interactive element state
//!
//! - **Element** - Element trait, z-layer kinds, capabilities
//! - **Focus** - Focused id signal, modal focus snapshots
//! - **Dispatch** - Hit-testing, event routing, dragging

mod dispatch;
mod element;
mod focus;

pub use dispatch::Router;
pub use element::{
    listener, Capabilities, Element, ElementEvent, ElementKind, ElementSpec, Listener,
};
pub use focus::FocusState;
